//! A single provider call.

use provider_core::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One call to dispatch against a named provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Registry name of the target provider.
    pub server: String,
    pub method: Method,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Caller-supplied correlation id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(server: impl Into<String>, method: Method) -> Self {
        Self {
            server: server.into(),
            method,
            params: Map::new(),
            id: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
