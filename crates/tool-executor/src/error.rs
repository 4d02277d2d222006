//! Call failure taxonomy.

use std::time::Duration;

use thiserror::Error;

/// Why a call failed.
///
/// `Clone` so batch results can carry the error next to the outcome it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// The attempt did not finish within the configured timeout. The
    /// underlying operation was abandoned, not cancelled.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The provider returned an error envelope.
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },

    /// Transport-level provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The spawned call task failed to join (panic or runtime shutdown).
    #[error("call task failed: {0}")]
    Task(String),

    /// The aggregator rejected the collected results.
    #[error("aggregation failed: {0}")]
    Aggregation(String),

    /// Aggregation had no successful results to work with.
    #[error("no successful results: {0}")]
    NoSuccesses(String),
}

impl CallError {
    /// Whether the failure looks transient and worth retrying under a
    /// conservative policy: timeouts, network trouble, rate limits.
    pub fn is_transient(&self) -> bool {
        match self {
            CallError::Timeout(_) => true,
            CallError::Provider(message) => {
                let m = message.to_lowercase();
                m.contains("network")
                    || m.contains("timeout")
                    || m.contains("unavailable")
                    || m.contains("rate limit")
                    || m.contains("429")
                    || m.contains("503")
            }
            CallError::Rejected { code, .. } => matches!(
                code.as_str(),
                "RATE_LIMITED" | "UNAVAILABLE" | "TIMEOUT" | "OVERLOADED"
            ),
            CallError::Task(_) | CallError::Aggregation(_) | CallError::NoSuccesses(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(CallError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(CallError::Provider("network error: connection reset".to_string()).is_transient());
        assert!(CallError::Rejected {
            code: "RATE_LIMITED".to_string(),
            message: "slow down".to_string(),
        }
        .is_transient());

        assert!(!CallError::Rejected {
            code: "INVALID_PARAMS".to_string(),
            message: "missing message".to_string(),
        }
        .is_transient());
        assert!(!CallError::Task("panicked".to_string()).is_transient());
    }
}
