//! Chat payload types shared by the router, the orchestrator and providers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::ProviderResponse;
use crate::error::ProviderError;

/// Who authored a history message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Caller-supplied context for one conversational turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnContext {
    /// Stable user identifier. Required for intervention persistence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Display name used for personalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Self-reported or inferred emotional state, e.g. `"anxious"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Life stage, e.g. `"pregnant"` or `"postpartum"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub life_stage: Option<String>,
}

/// Parameters for a `chat.send` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TurnContext>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryMessage>,
}

impl ChatParams {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            history: Vec::new(),
        }
    }

    /// Serialize into a request parameter map.
    pub fn into_params(self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Parse from a request parameter map.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, ProviderError> {
        serde_json::from_value(Value::Object(params.clone()))
            .map_err(|e| ProviderError::InvalidParams(e.to_string()))
    }
}

/// Reply payload of a successful `chat.send` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
}

impl ChatReply {
    /// Pull the reply text out of a response envelope.
    ///
    /// Returns `None` when the envelope carries no usable message; callers
    /// treat that as a failed hop rather than sending an empty reply.
    pub fn from_response(response: &ProviderResponse) -> Option<String> {
        let data = response.data.as_ref()?;
        let message = data.get("message")?.as_str()?;
        if message.is_empty() {
            return None;
        }
        Some(message.to_string())
    }
}
