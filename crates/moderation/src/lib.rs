//! Crisis detection and response moderation.
//!
//! Three layers, ordered by precision:
//! 1. literal keyword families ([`ModerationEngine`]), which also drive
//!    disclaimers and the blocked-reply path,
//! 2. contextual phrase patterns for distress idioms that dodge literal
//!    matching,
//! 3. an optional AI emotion classifier behind [`EmotionClassifier`], with a
//!    deterministic fallback when it fails.
//!
//! Severe and critical detections persist a [`CrisisIntervention`] through
//! the [`InterventionStore`] seam without ever blocking the conversation.
//! All user-facing safety texts are in Brazilian Portuguese.

mod crisis;
mod emotion;
mod engine;
mod intervention;
mod patterns;
mod phrases;

pub use crisis::{
    CrisisDetectionResult, CrisisDetector, CrisisLevel, CrisisType, SyncCrisisCheck,
};
pub use emotion::{EmotionAnalysis, EmotionClassifier, Intensity};
pub use engine::{KeywordScan, ModeratedReply, ModerationEngine, ModerationResult};
pub use intervention::{
    follow_up_delay, CrisisIntervention, InterventionError, InterventionOutcome, InterventionStore,
    MemoryInterventionStore,
};
pub use patterns::{ModerationCategory, ModerationSeverity, RESOURCE_CAPS, RESOURCE_CVV, RESOURCE_SAMU};
pub use phrases::{ContextualPhrase, ContextualScan};
