//! Provider method identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operations a provider can be asked to perform.
///
/// The set is closed on purpose: providers dispatch with an exhaustive
/// `match`, so adding a method is a compile-time change in every provider
/// rather than a string nobody handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Send a conversational message and receive a reply.
    #[serde(rename = "chat.send")]
    ChatSend,
    /// Classify the emotional content of a text.
    #[serde(rename = "analyze.emotion")]
    AnalyzeEmotion,
    /// Record an analytics event.
    #[serde(rename = "event.track")]
    EventTrack,
}

impl Method {
    /// Wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::ChatSend => "chat.send",
            Method::AnalyzeEmotion => "analyze.emotion",
            Method::EventTrack => "event.track",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when parsing a method name that no provider understands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat.send" => Ok(Method::ChatSend),
            "analyze.emotion" => Ok(Method::AnalyzeEmotion),
            "event.track" => Ok(Method::EventTrack),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_wire_names() {
        for method in [Method::ChatSend, Method::AnalyzeEmotion, Method::EventTrack] {
            assert_eq!(method.as_str().parse::<Method>(), Ok(method));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "chat.stream".parse::<Method>().unwrap_err();
        assert_eq!(err, UnknownMethod("chat.stream".to_string()));
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Method::AnalyzeEmotion).unwrap();
        assert_eq!(json, "\"analyze.emotion\"");
        let back: Method = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Method::AnalyzeEmotion);
    }
}
