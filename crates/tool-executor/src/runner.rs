//! The seam between the executor and provider resolution.

use async_trait::async_trait;
use provider_core::{ProviderError, ProviderRequest, ProviderResponse};

/// Dispatches one request to a named provider.
///
/// The executor stays ignorant of how providers are looked up: the
/// orchestrator backs this with the registry, tests back it with doubles.
#[async_trait]
pub trait CallRunner: Send + Sync {
    async fn run(
        &self,
        server: &str,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError>;
}
