//! Crisis interventions and the store seam.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::crisis::{CrisisLevel, CrisisType};

/// User messages are truncated to this many characters before persisting.
const MESSAGE_LIMIT: usize = 500;

#[derive(Debug, Clone, Error)]
pub enum InterventionError {
    #[error("intervention store error: {0}")]
    Store(String),
}

/// How a crisis episode resolved, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionOutcome {
    ContactedCvv,
    ContactedEmergency,
    ContinuedChat,
    LeftApp,
    Unknown,
}

impl InterventionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionOutcome::ContactedCvv => "contacted_cvv",
            InterventionOutcome::ContactedEmergency => "contacted_emergency",
            InterventionOutcome::ContinuedChat => "continued_chat",
            InterventionOutcome::LeftApp => "left_app",
            InterventionOutcome::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "contacted_cvv" => Some(InterventionOutcome::ContactedCvv),
            "contacted_emergency" => Some(InterventionOutcome::ContactedEmergency),
            "continued_chat" => Some(InterventionOutcome::ContinuedChat),
            "left_app" => Some(InterventionOutcome::LeftApp),
            "unknown" => Some(InterventionOutcome::Unknown),
            _ => None,
        }
    }
}

/// Follow-up cadence by severity. The worse the episode, the sooner the
/// companion checks in again.
pub fn follow_up_delay(level: CrisisLevel) -> Option<Duration> {
    match level {
        CrisisLevel::Critical => Some(Duration::hours(6)),
        CrisisLevel::Severe => Some(Duration::hours(12)),
        CrisisLevel::Moderate => Some(Duration::hours(24)),
        CrisisLevel::Mild => Some(Duration::hours(48)),
        CrisisLevel::None => None,
    }
}

/// A persisted record of one crisis episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisIntervention {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub level: CrisisLevel,
    pub crisis_types: Vec<CrisisType>,
    /// Truncated excerpt of what the user wrote, for the follow-up context.
    pub user_message: String,
    pub resources_shown: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<InterventionOutcome>,
    pub follow_up_needed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CrisisIntervention {
    pub fn new(
        user_id: impl Into<String>,
        level: CrisisLevel,
        crisis_types: Vec<CrisisType>,
        user_message: &str,
        resources_shown: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        CrisisIntervention {
            id: format!("crisis_{}", Uuid::new_v4().simple()),
            user_id: user_id.into(),
            timestamp: now,
            level,
            crisis_types,
            user_message: truncate_chars(user_message, MESSAGE_LIMIT),
            resources_shown,
            outcome: None,
            follow_up_needed: level >= CrisisLevel::Severe,
            follow_up_at: follow_up_delay(level).map(|delay| now + delay),
            notes: None,
        }
    }
}

// Truncation counts characters, not bytes, so accented text never splits a
// code point.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

/// Persistence seam for crisis interventions.
///
/// Implementations must tolerate concurrent writers; the detector inserts
/// from detached tasks.
#[async_trait]
pub trait InterventionStore: Send + Sync {
    async fn insert(&self, intervention: &CrisisIntervention) -> Result<(), InterventionError>;

    /// Records how an episode resolved and clears its follow-up flag.
    async fn update_outcome(
        &self,
        intervention_id: &str,
        outcome: InterventionOutcome,
        notes: Option<String>,
    ) -> Result<(), InterventionError>;

    /// Interventions whose follow-up is due at `now` and still have no
    /// recorded outcome, most recent episode first.
    async fn pending_follow_ups(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<CrisisIntervention>, InterventionError>;

    /// Severe or critical episodes for `user_id` at or after `cutoff`.
    async fn recent_severe_count(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, InterventionError>;
}

/// In-memory store, for tests and single-process setups.
#[derive(Debug, Default)]
pub struct MemoryInterventionStore {
    interventions: RwLock<Vec<CrisisIntervention>>,
}

impl MemoryInterventionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryInterventionStore::default())
    }

    pub async fn all(&self) -> Vec<CrisisIntervention> {
        self.interventions.read().await.clone()
    }
}

#[async_trait]
impl InterventionStore for MemoryInterventionStore {
    async fn insert(&self, intervention: &CrisisIntervention) -> Result<(), InterventionError> {
        self.interventions.write().await.push(intervention.clone());
        Ok(())
    }

    async fn update_outcome(
        &self,
        intervention_id: &str,
        outcome: InterventionOutcome,
        notes: Option<String>,
    ) -> Result<(), InterventionError> {
        let mut interventions = self.interventions.write().await;
        let Some(entry) = interventions.iter_mut().find(|i| i.id == intervention_id) else {
            return Err(InterventionError::Store(format!(
                "intervention '{}' not found",
                intervention_id
            )));
        };
        entry.outcome = Some(outcome);
        entry.notes = notes;
        entry.follow_up_needed = false;
        Ok(())
    }

    async fn pending_follow_ups(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<CrisisIntervention>, InterventionError> {
        let interventions = self.interventions.read().await;
        let mut due: Vec<CrisisIntervention> = interventions
            .iter()
            .filter(|i| {
                i.follow_up_needed
                    && i.outcome.is_none()
                    && i.follow_up_at.map(|at| at <= now).unwrap_or(false)
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn recent_severe_count(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, InterventionError> {
        let interventions = self.interventions.read().await;
        Ok(interventions
            .iter()
            .filter(|i| {
                i.user_id == user_id && i.level >= CrisisLevel::Severe && i.timestamp >= cutoff
            })
            .count() as u64)
    }
}
