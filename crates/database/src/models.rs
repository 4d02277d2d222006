//! Database models and row conversions.

use chrono::{DateTime, SecondsFormat, Utc};
use moderation::{CrisisIntervention, CrisisLevel, CrisisType, InterventionOutcome};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{DatabaseError, Result};

/// A crisis intervention row as stored.
///
/// Level and outcome are stored as their canonical snake_case strings;
/// crisis_types and resources_shown as JSON arrays. Timestamps are RFC 3339
/// TEXT in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct InterventionRecord {
    /// Intervention ID (e.g., "crisis_9f8a...").
    pub id: String,
    /// Owning user ID.
    pub user_id: String,
    /// When the episode was detected.
    pub timestamp: String,
    /// Crisis level string ("severe", "critical", ...).
    pub level: String,
    /// JSON array of crisis type strings.
    pub crisis_types: String,
    /// Truncated excerpt of the triggering message.
    pub user_message: String,
    /// JSON array of resource strings shown to the user.
    pub resources_shown: String,
    /// Outcome string, once known.
    pub outcome: Option<String>,
    /// Whether a follow-up is still owed.
    pub follow_up_needed: bool,
    /// When the follow-up is due.
    pub follow_up_at: Option<String>,
    /// Free-form notes from the outcome update.
    pub notes: Option<String>,
}

impl InterventionRecord {
    pub fn from_intervention(intervention: &CrisisIntervention) -> Result<Self> {
        Ok(InterventionRecord {
            id: intervention.id.clone(),
            user_id: intervention.user_id.clone(),
            timestamp: format_timestamp(intervention.timestamp),
            level: intervention.level.as_str().to_string(),
            crisis_types: serde_json::to_string(&intervention.crisis_types)?,
            user_message: intervention.user_message.clone(),
            resources_shown: serde_json::to_string(&intervention.resources_shown)?,
            outcome: intervention.outcome.map(|o| o.as_str().to_string()),
            follow_up_needed: intervention.follow_up_needed,
            follow_up_at: intervention.follow_up_at.map(format_timestamp),
            notes: intervention.notes.clone(),
        })
    }

    pub fn into_intervention(self) -> Result<CrisisIntervention> {
        let level = CrisisLevel::parse(&self.level).ok_or(DatabaseError::Corrupted {
            column: "level",
            value: self.level.clone(),
        })?;
        let outcome = match self.outcome {
            Some(value) => Some(InterventionOutcome::parse(&value).ok_or(
                DatabaseError::Corrupted {
                    column: "outcome",
                    value,
                },
            )?),
            None => None,
        };
        let crisis_types: Vec<CrisisType> = serde_json::from_str(&self.crisis_types)?;
        let resources_shown: Vec<String> = serde_json::from_str(&self.resources_shown)?;
        let follow_up_at = match self.follow_up_at {
            Some(value) => Some(parse_timestamp("follow_up_at", &value)?),
            None => None,
        };

        Ok(CrisisIntervention {
            timestamp: parse_timestamp("timestamp", &self.timestamp)?,
            id: self.id,
            user_id: self.user_id,
            level,
            crisis_types,
            user_message: self.user_message,
            resources_shown,
            outcome,
            follow_up_needed: self.follow_up_needed,
            follow_up_at,
            notes: self.notes,
        })
    }
}

/// Fixed-precision RFC 3339 in UTC, so TEXT comparison is chronological.
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| DatabaseError::Corrupted {
            column,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_round_trip() {
        let intervention = CrisisIntervention::new(
            "user-1",
            CrisisLevel::Severe,
            vec![CrisisType::Overwhelm, CrisisType::Anxiety],
            "não aguento mais",
            vec!["CVV 188".to_string()],
        );
        let record = InterventionRecord::from_intervention(&intervention).unwrap();
        assert_eq!(record.level, "severe");
        assert!(record.crisis_types.contains("overwhelm"));

        let back = record.into_intervention().unwrap();
        assert_eq!(back.id, intervention.id);
        assert_eq!(back.level, intervention.level);
        assert_eq!(back.crisis_types, intervention.crisis_types);
        assert_eq!(back.follow_up_needed, intervention.follow_up_needed);
    }

    #[test]
    fn unknown_level_strings_are_rejected() {
        let intervention = CrisisIntervention::new(
            "user-1",
            CrisisLevel::Critical,
            vec![CrisisType::SuicidalIdeation],
            "mensagem",
            Vec::new(),
        );
        let mut record = InterventionRecord::from_intervention(&intervention).unwrap();
        record.level = "catastrophic".to_string();
        let err = record.into_intervention().unwrap_err();
        assert!(matches!(err, DatabaseError::Corrupted { column: "level", .. }));
    }

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let formatted = format_timestamp(Utc::now());
        assert!(formatted.ends_with('Z'));
        assert!(parse_timestamp("timestamp", &formatted).is_ok());
        assert!(parse_timestamp("timestamp", "ontem à noite").is_err());
    }
}
