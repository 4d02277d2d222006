//! Error types for orchestrator operations.

use provider_core::ProviderError;
use provider_registry::RegistryError;
use thiserror::Error;

/// Errors surfaced by the orchestrator's direct call paths.
///
/// The conversational turn pipeline never returns these; it degrades to a
/// scripted reply instead. Direct provider calls do.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The registry could not produce the requested provider.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] RegistryError),

    /// A provider failed while handling a request.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}
