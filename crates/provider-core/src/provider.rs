//! The [`Provider`] trait.

use async_trait::async_trait;

use crate::envelope::{ProviderRequest, ProviderResponse};
use crate::error::ProviderError;

/// An AI provider that can process Amparo requests.
///
/// Implementations are shared behind `Arc` and must be safe to call
/// concurrently. Two failure channels exist and callers treat both as a
/// failed call: `Err` signals a transport-level problem, while a response
/// with `success == false` is an error envelope produced by the provider
/// itself.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short stable identifier, e.g. `"googleai"`.
    fn name(&self) -> &str;

    /// Prepare the provider for use.
    ///
    /// The registry calls this once before the first request. The default
    /// implementation does nothing.
    async fn initialize(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Handle one request envelope.
    async fn handle_request(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Release resources on shutdown. The default implementation does nothing.
    async fn shutdown(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider").field("name", &self.name()).finish_non_exhaustive()
    }
}
