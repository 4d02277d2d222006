//! Timeout, retry and batch execution for provider calls.
//!
//! The executor owns the delivery contract for every provider call in
//! Amparo:
//!
//! - a per-attempt timeout that abandons (never cancels) the underlying
//!   operation,
//! - exponential-backoff retries behind a pluggable predicate,
//! - parallel batches that isolate failures and report in completion order,
//! - sequential batches that settle one call before starting the next,
//! - aggregation over the successful subset of a parallel batch.
//!
//! Provider lookup hides behind [`CallRunner`], so the engine works the same
//! against the registry, a single provider, or test doubles.

mod call;
mod error;
mod executor;
mod options;
mod outcome;
mod runner;

pub use call::ToolCall;
pub use error::CallError;
pub use executor::ToolExecutor;
pub use options::{ExecutionOptions, RetryConfig, RetryPredicate};
pub use outcome::{BatchOutcome, CallFailure, CallOutcome};
pub use runner::CallRunner;
