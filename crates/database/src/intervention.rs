//! Crisis intervention persistence.

use chrono::{DateTime, Utc};
use moderation::{CrisisIntervention, InterventionOutcome};
use sqlx::SqlitePool;

use crate::models::{format_timestamp, InterventionRecord};
use crate::{DatabaseError, Result};

/// Insert a crisis intervention.
pub async fn insert_intervention(
    pool: &SqlitePool,
    intervention: &CrisisIntervention,
) -> Result<()> {
    let record = InterventionRecord::from_intervention(intervention)?;
    sqlx::query(
        r#"
        INSERT INTO crisis_interventions
            (id, user_id, timestamp, level, crisis_types, user_message,
             resources_shown, outcome, follow_up_needed, follow_up_at, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.timestamp)
    .bind(&record.level)
    .bind(&record.crisis_types)
    .bind(&record.user_message)
    .bind(&record.resources_shown)
    .bind(&record.outcome)
    .bind(record.follow_up_needed)
    .bind(&record.follow_up_at)
    .bind(&record.notes)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get one intervention by ID.
pub async fn get_intervention(pool: &SqlitePool, id: &str) -> Result<CrisisIntervention> {
    let record = sqlx::query_as::<_, InterventionRecord>(
        r#"
        SELECT id, user_id, timestamp, level, crisis_types, user_message,
               resources_shown, outcome, follow_up_needed, follow_up_at, notes
        FROM crisis_interventions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "intervention",
        id: id.to_string(),
    })?;

    record.into_intervention()
}

/// Record how an intervention resolved and clear its follow-up flag.
pub async fn update_outcome(
    pool: &SqlitePool,
    id: &str,
    outcome: InterventionOutcome,
    notes: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE crisis_interventions
        SET outcome = ?, notes = ?, follow_up_needed = 0
        WHERE id = ?
        "#,
    )
    .bind(outcome.as_str())
    .bind(notes)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "intervention",
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Interventions whose follow-up is due at `now` and still unresolved,
/// most recent episode first.
pub async fn pending_follow_ups(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<CrisisIntervention>> {
    let rows = sqlx::query_as::<_, InterventionRecord>(
        r#"
        SELECT id, user_id, timestamp, level, crisis_types, user_message,
               resources_shown, outcome, follow_up_needed, follow_up_at, notes
        FROM crisis_interventions
        WHERE follow_up_needed = 1
          AND outcome IS NULL
          AND follow_up_at IS NOT NULL
          AND follow_up_at <= ?
        ORDER BY timestamp DESC
        LIMIT ?
        "#,
    )
    .bind(format_timestamp(now))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(InterventionRecord::into_intervention)
        .collect()
}

/// Count severe or critical episodes for a user at or after `cutoff`.
pub async fn recent_severe_count(
    pool: &SqlitePool,
    user_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM crisis_interventions
        WHERE user_id = ?
          AND timestamp >= ?
          AND level IN ('severe', 'critical')
        "#,
    )
    .bind(user_id)
    .bind(format_timestamp(cutoff))
    .fetch_one(pool)
    .await?;

    Ok(count as u64)
}

/// Recent interventions for a user, newest first.
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<CrisisIntervention>> {
    let rows = sqlx::query_as::<_, InterventionRecord>(
        r#"
        SELECT id, user_id, timestamp, level, crisis_types, user_message,
               resources_shown, outcome, follow_up_needed, follow_up_at, notes
        FROM crisis_interventions
        WHERE user_id = ?
        ORDER BY timestamp DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(InterventionRecord::into_intervention)
        .collect()
}
