//! Delayed provider implementation - wraps another provider with artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use provider_core::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// A provider that wraps another provider and adds artificial delay.
///
/// Useful for testing timeout handling and simulating real provider latency.
pub struct DelayedProvider<P: Provider> {
    inner: P,
    delay: Duration,
}

impl<P: Provider> DelayedProvider<P> {
    /// Create a new DelayedProvider wrapping the given provider with the
    /// specified delay.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a provider with a delay in milliseconds.
    pub fn with_millis(inner: P, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<P: Provider> Provider for DelayedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        self.inner.initialize().await
    }

    async fn handle_request(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        sleep(self.delay).await;
        self.inner.handle_request(request).await
    }

    async fn shutdown(&self) -> Result<(), ProviderError> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use provider_core::{ChatParams, Method};

    use crate::EchoProvider;

    use super::*;

    #[tokio::test]
    async fn test_delayed_provider() {
        let provider = DelayedProvider::with_millis(EchoProvider::new(), 100);
        let request =
            ProviderRequest::new(Method::ChatSend, ChatParams::new("teste").into_params());

        let start = Instant::now();
        let response = provider.handle_request(request).await.unwrap();
        let elapsed = start.elapsed();

        assert!(response.success);
        assert!(elapsed >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_name_comes_from_the_inner_provider() {
        let provider = DelayedProvider::with_millis(EchoProvider::new(), 0);
        assert_eq!(provider.name(), "echo");
    }
}
