//! The reply produced by one conversational turn.

use moderation::{CrisisDetectionResult, ModerationResult};
use serde::{Deserialize, Serialize};

use crate::profiles::LlmProfile;

/// Outcome of [`Orchestrator::send_turn`](crate::Orchestrator::send_turn).
///
/// `text` has already been moderated and is safe to show. `provider_used`
/// is the registry name that produced it (suffixed `-direct` for the direct
/// fallback provider), or `None` when every provider failed and the
/// scripted apology went out instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub text: String,
    pub profile: LlmProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_used: Option<String>,
    pub moderation: ModerationResult,
    /// Set when the detector found anything above a quiet baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crisis: Option<CrisisDetectionResult>,
}

impl TurnReply {
    /// Whether a provider, rather than the scripted apology, answered.
    pub fn answered(&self) -> bool {
        self.provider_used.is_some()
    }
}
