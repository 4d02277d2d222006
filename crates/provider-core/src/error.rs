//! Error types for provider implementations.

use thiserror::Error;

/// Transport-level failures a provider can raise.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider cannot be reached or is not ready.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider is misconfigured (missing key, bad endpoint).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A network failure occurred while talking to the provider.
    #[error("network error: {0}")]
    Network(String),

    /// The provider failed while processing the request.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The request parameters were malformed for the method.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The provider timed out internally.
    #[error("provider timed out")]
    Timeout,

    /// The provider has been shut down.
    #[error("provider is shut down")]
    ShutDown,
}
