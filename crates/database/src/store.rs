//! SQLite-backed intervention store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moderation::{CrisisIntervention, InterventionError, InterventionOutcome, InterventionStore};
use sqlx::SqlitePool;

use crate::intervention;
use crate::Database;

/// [`InterventionStore`] implementation over the shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteInterventionStore {
    pool: SqlitePool,
}

impl SqliteInterventionStore {
    pub fn new(db: &Database) -> Self {
        SqliteInterventionStore {
            pool: db.pool().clone(),
        }
    }
}

#[async_trait]
impl InterventionStore for SqliteInterventionStore {
    async fn insert(&self, record: &CrisisIntervention) -> Result<(), InterventionError> {
        intervention::insert_intervention(&self.pool, record)
            .await
            .map_err(|err| InterventionError::Store(err.to_string()))
    }

    async fn update_outcome(
        &self,
        intervention_id: &str,
        outcome: InterventionOutcome,
        notes: Option<String>,
    ) -> Result<(), InterventionError> {
        intervention::update_outcome(&self.pool, intervention_id, outcome, notes.as_deref())
            .await
            .map_err(|err| InterventionError::Store(err.to_string()))
    }

    async fn pending_follow_ups(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<CrisisIntervention>, InterventionError> {
        intervention::pending_follow_ups(&self.pool, now, limit as i64)
            .await
            .map_err(|err| InterventionError::Store(err.to_string()))
    }

    async fn recent_severe_count(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, InterventionError> {
        intervention::recent_severe_count(&self.pool, user_id, cutoff)
            .await
            .map_err(|err| InterventionError::Store(err.to_string()))
    }
}
