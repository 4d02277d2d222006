//! Flaky provider implementation - fails a few times, then recovers.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use provider_core::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// A provider that fails its first N requests at the transport level and
/// then delegates to the wrapped provider.
///
/// Built for exercising retry policies: the failures look like transient
/// network errors, so transient-only predicates keep retrying.
pub struct FlakyProvider<P: Provider> {
    inner: P,
    failures_remaining: AtomicU32,
}

impl<P: Provider> FlakyProvider<P> {
    /// Fail the first `failures` requests, then behave like `inner`.
    pub fn failing_times(inner: P, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl<P: Provider> Provider for FlakyProvider<P> {
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
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ProviderError::Network(
                "falha transitória simulada".to_string(),
            ));
        }
        self.inner.handle_request(request).await
    }

    async fn shutdown(&self) -> Result<(), ProviderError> {
        self.inner.shutdown().await
    }
}
