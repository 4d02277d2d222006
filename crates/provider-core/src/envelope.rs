//! Request and response envelopes exchanged with providers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::method::Method;

/// A single request to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// Correlation id, echoed back in the response.
    pub id: String,
    pub method: Method,
    /// Method-specific parameters.
    pub params: Map<String, Value>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl ProviderRequest {
    /// Create a request with a generated id.
    pub fn new(method: Method, params: Map<String, Value>) -> Self {
        Self::with_id(format!("req_{}", Uuid::new_v4().simple()), method, params)
    }

    /// Create a request with a caller-supplied id.
    ///
    /// The executor uses this so every retry of a call carries the same
    /// correlation id.
    pub fn with_id(id: impl Into<String>, method: Method, params: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            method,
            params,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Fetch a string parameter by key.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// Error payload carried by a failed response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    /// Stable machine-readable code, e.g. `RATE_LIMITED`.
    pub code: String,
    pub message: String,
}

/// A provider's reply to a [`ProviderRequest`].
///
/// `success == false` with a [`ResponseError`] is the in-band failure
/// channel; transport failures surface as `Err` from
/// [`Provider::handle_request`](crate::Provider::handle_request) instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Correlation id copied from the request.
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl ProviderResponse {
    /// Successful response carrying `data`.
    pub fn ok(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Failed response with a machine-readable code and a message.
    pub fn err(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(ResponseError {
                code: code.into(),
                message: message.into(),
            }),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_are_unique() {
        let a = ProviderRequest::new(Method::ChatSend, Map::new());
        let b = ProviderRequest::new(Method::ChatSend, Map::new());
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("req_"));
    }

    #[test]
    fn param_str_reads_string_values() {
        let mut params = Map::new();
        params.insert("message".to_string(), json!("oi"));
        params.insert("count".to_string(), json!(3));
        let request = ProviderRequest::new(Method::ChatSend, params);
        assert_eq!(request.param_str("message"), Some("oi"));
        assert_eq!(request.param_str("count"), None);
        assert_eq!(request.param_str("missing"), None);
    }

    #[test]
    fn ok_and_err_constructors_set_the_success_flag() {
        let ok = ProviderResponse::ok("r1", json!({"message": "olá"}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = ProviderResponse::err("r1", "RATE_LIMITED", "slow down");
        assert!(!err.success);
        assert!(err.data.is_none());
        let payload = err.error.unwrap();
        assert_eq!(payload.code, "RATE_LIMITED");
    }
}
