//! Echo provider implementation - echoes chat messages back.

use async_trait::async_trait;
use serde_json::json;

use provider_core::{ChatParams, Method, Provider, ProviderError, ProviderRequest, ProviderResponse};

/// A simple provider that echoes chat messages back to the caller.
///
/// Useful for testing the conversation flow without any AI processing.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoProvider {
    /// Create a new EchoProvider with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoProvider with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_provider::EchoProvider;
    ///
    /// let provider = EchoProvider::with_prefix("Echo: ");
    /// // chat.send will answer with "Echo: <original message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle_request(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        match request.method {
            Method::ChatSend => {
                let params = ChatParams::from_params(&request.params)?;
                let reply = match &self.prefix {
                    Some(prefix) => format!("{}{}", prefix, params.message),
                    None => params.message,
                };
                Ok(ProviderResponse::ok(request.id, json!({ "message": reply })))
            }
            Method::EventTrack => {
                Ok(ProviderResponse::ok(request.id, json!({ "tracked": true })))
            }
            Method::AnalyzeEmotion => Ok(ProviderResponse::err(
                request.id,
                "UNSUPPORTED",
                "echo provider cannot analyze emotions",
            )),
        }
    }
}
