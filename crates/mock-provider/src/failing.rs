//! Failing provider implementation - always fails, one way or another.

use async_trait::async_trait;

use provider_core::{Provider, ProviderError, ProviderRequest, ProviderResponse};

/// Whether failures surface as transport errors or as error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// `handle_request` returns `Err(ProviderError::Unavailable)`.
    Transport,
    /// `handle_request` returns `Ok` with a failed response envelope.
    Envelope,
}

/// A provider wired to fail every request.
///
/// Fallback-chain tests need both failure flavors: transport errors and
/// in-band error envelopes must walk the chain the same way.
pub struct FailingProvider {
    name: String,
    mode: FailureMode,
    fail_init: bool,
}

impl FailingProvider {
    /// Fail at the transport level.
    pub fn transport(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Transport,
            fail_init: false,
        }
    }

    /// Fail in-band with an error envelope.
    pub fn envelope(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: FailureMode::Envelope,
            fail_init: false,
        }
    }

    /// Also fail `initialize`, for registry construction tests.
    pub fn with_failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&self) -> Result<(), ProviderError> {
        if self.fail_init {
            return Err(ProviderError::Configuration(format!(
                "provider '{}' is wired to fail initialization",
                self.name
            )));
        }
        Ok(())
    }

    async fn handle_request(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        match self.mode {
            FailureMode::Transport => Err(ProviderError::Unavailable(format!(
                "provider '{}' is wired to fail",
                self.name
            ))),
            FailureMode::Envelope => Ok(ProviderResponse::err(
                request.id,
                "PROVIDER_DOWN",
                format!("provider '{}' is wired to fail", self.name),
            )),
        }
    }
}
