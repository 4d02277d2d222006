//! Conversation orchestrator for routing turns through AI providers.
//!
//! This crate provides the [`Orchestrator`] type which coordinates each
//! conversational turn between the provider registry, the execution engine
//! and the safety layer.
//!
//! # Features
//!
//! - Routes each turn to an [`LlmProfile`] with a provider fallback chain
//! - Runs crisis detection before and moderation after every reply
//! - Persists severe episodes through the intervention store, off the hot path
//! - Delegates batch work to the tool executor (timeouts, retries)
//! - Tracks analytics events without ever blocking a turn
//!
//! # Architecture
//!
//! ```text
//! User message (companion app)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  1. Crisis detection (keywords → phrases → classifier)      │
//! │         ↓                                                   │
//! │  2. Route to a profile; crisis verdicts override            │
//! │         ↓                                                   │
//! │  3. Walk the profile's provider chain via the registry:     │
//! │     • googleai / openai / anthropic, primary first          │
//! │     • direct fallback provider, then scripted apology       │
//! │         ↓                                                   │
//! │  4. Moderate the outgoing text (disclaimers, blocking)      │
//! │         ↓                                                   │
//! │  5. Track the turn, return the moderated reply              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use orchestrator::{Orchestrator, OrchestratorConfig};
//! use provider_core::TurnContext;
//! use provider_registry::{ProviderRegistration, ProviderRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(ProviderRegistry::new());
//!     registry
//!         .register(ProviderRegistration::new("googleai", googleai_factory()))
//!         .await;
//!
//!     let orchestrator = Orchestrator::new(registry);
//!
//!     let context = TurnContext {
//!         user_id: Some("user-1".to_string()),
//!         ..TurnContext::default()
//!     };
//!     let reply = orchestrator.send_turn("oi, tudo bem?", &context, &[]).await;
//!
//!     println!("{} ({})", reply.text, reply.profile);
//! }
//! ```

mod classifier;
mod error;
mod orchestrator;
mod profiles;
mod router;
mod turn;

// Public exports
pub use classifier::RegistryEmotionClassifier;
pub use error::OrchestratorError;
pub use orchestrator::{Orchestrator, OrchestratorConfig, FALLBACK_APOLOGY};
pub use profiles::{LlmProfile, KNOWN_PROVIDERS};
pub use router::select_profile;
pub use turn::TurnReply;

// Re-export commonly used types from dependencies
pub use moderation::{CrisisDetectionResult, CrisisDetector, CrisisLevel, ModerationResult};
pub use provider_core::{HistoryMessage, Role, TurnContext};
pub use provider_registry::{ProviderRegistration, ProviderRegistry};
pub use tool_executor::{ExecutionOptions, RetryConfig, ToolCall};
