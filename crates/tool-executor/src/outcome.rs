//! Call and batch outcomes.

use std::time::Duration;

use serde_json::Value;

use crate::error::CallError;

/// The settled result of one executed call.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    /// Correlation id, caller-supplied or generated.
    pub call_id: String,
    /// Target provider, or `"aggregator"` for aggregation outcomes.
    pub server: String,
    /// Wire method name, or `"aggregate"`.
    pub method: String,
    pub result: Result<Value, CallError>,
    /// Wall-clock time from first attempt to settlement.
    pub execution_time: Duration,
    /// Invocations actually made, retries included.
    pub attempts: u32,
}

impl CallOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn data(&self) -> Option<&Value> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&CallError> {
        self.result.as_ref().err()
    }
}

/// A failure correlated back to the call that produced it.
#[derive(Debug, Clone)]
pub struct CallFailure {
    pub server: String,
    pub method: String,
    pub call_id: String,
    pub error: CallError,
}

/// The settled result of a batch execution.
///
/// `outcomes` are in completion order for parallel batches and input order
/// for sequential ones. One call's failure never disturbs its siblings.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub all_succeeded: bool,
    pub outcomes: Vec<CallOutcome>,
    /// Payloads of the successful calls, in `outcomes` order.
    pub data: Vec<Value>,
    pub errors: Vec<CallFailure>,
    pub total_time: Duration,
}

impl BatchOutcome {
    pub(crate) fn empty() -> Self {
        Self {
            all_succeeded: true,
            outcomes: Vec::new(),
            data: Vec::new(),
            errors: Vec::new(),
            total_time: Duration::ZERO,
        }
    }

    pub(crate) fn collect(outcomes: Vec<CallOutcome>, total_time: Duration) -> Self {
        let mut data = Vec::new();
        let mut errors = Vec::new();
        for outcome in &outcomes {
            match &outcome.result {
                Ok(value) => data.push(value.clone()),
                Err(error) => errors.push(CallFailure {
                    server: outcome.server.clone(),
                    method: outcome.method.clone(),
                    call_id: outcome.call_id.clone(),
                    error: error.clone(),
                }),
            }
        }
        Self {
            all_succeeded: errors.is_empty(),
            outcomes,
            data,
            errors,
            total_time,
        }
    }
}
