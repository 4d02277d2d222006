//! The execution engine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use provider_core::ProviderRequest;
use serde_json::Value;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::call::ToolCall;
use crate::error::CallError;
use crate::options::ExecutionOptions;
use crate::outcome::{BatchOutcome, CallOutcome};
use crate::runner::CallRunner;

/// Executes provider calls with per-attempt timeouts and retry backoff.
///
/// The executor is cheap to share and keeps no per-call state beyond a
/// counter for generated correlation ids.
#[derive(Debug, Default)]
pub struct ToolExecutor {
    call_counter: AtomicU64,
}

impl ToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_call_id(&self) -> String {
        let n = self.call_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("call_{}", n)
    }

    /// Execute one call under the configured timeout and retry policy.
    ///
    /// Each attempt runs as a spawned task. When an attempt exceeds the
    /// timeout the executor stops waiting and moves on; the spawned task is
    /// left running and its eventual result is discarded. The timeout spans
    /// a single attempt, not the whole retry budget.
    pub async fn execute(
        &self,
        call: &ToolCall,
        runner: &Arc<dyn CallRunner>,
        options: &ExecutionOptions,
    ) -> CallOutcome {
        let call_id = call.id.clone().unwrap_or_else(|| self.next_call_id());
        let max_attempts = options.retry.max_attempts.max(1);
        let started = Instant::now();

        let mut attempts = 0;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            attempts = attempt;
            debug!(
                "call '{}': {} on '{}' (attempt {}/{})",
                call_id, call.method, call.server, attempt, max_attempts
            );

            match self.attempt_once(call, &call_id, runner, options.timeout).await {
                Ok(data) => {
                    debug!(
                        "call '{}' succeeded in {:?} after {} attempt(s)",
                        call_id,
                        started.elapsed(),
                        attempt
                    );
                    return CallOutcome {
                        call_id,
                        server: call.server.clone(),
                        method: call.method.to_string(),
                        result: Ok(data),
                        execution_time: started.elapsed(),
                        attempts: attempt,
                    };
                }
                Err(error) => {
                    let will_retry = attempt < max_attempts && options.retry.should_retry(&error);
                    if will_retry {
                        let delay = options.retry.backoff_delay(attempt);
                        warn!(
                            "call '{}' failed on attempt {}/{}: {}; retrying in {:?}",
                            call_id, attempt, max_attempts, error, delay
                        );
                        last_error = Some(error);
                        sleep(delay).await;
                    } else {
                        warn!(
                            "call '{}' failed permanently after {} attempt(s): {}",
                            call_id, attempt, error
                        );
                        last_error = Some(error);
                        break;
                    }
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| CallError::Provider("call made no attempts".to_string()));
        CallOutcome {
            call_id,
            server: call.server.clone(),
            method: call.method.to_string(),
            result: Err(error),
            execution_time: started.elapsed(),
            attempts,
        }
    }

    async fn attempt_once(
        &self,
        call: &ToolCall,
        call_id: &str,
        runner: &Arc<dyn CallRunner>,
        limit: Option<Duration>,
    ) -> Result<Value, CallError> {
        let server = call.server.clone();
        let request = ProviderRequest::with_id(call_id.to_string(), call.method, call.params.clone());
        let runner = Arc::clone(runner);
        let handle = tokio::spawn(async move { runner.run(&server, request).await });

        let joined = match limit {
            Some(limit) => match timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    // Dropping the join handle abandons the task without
                    // cancelling it; a slow provider call finishes on its own
                    // and the result is discarded.
                    warn!(
                        "call '{}' to '{}' exceeded {:?}; abandoning the attempt",
                        call_id, call.server, limit
                    );
                    return Err(CallError::Timeout(limit));
                }
            },
            None => handle.await,
        };

        let response = match joined {
            Ok(Ok(response)) => response,
            Ok(Err(provider_err)) => return Err(CallError::Provider(provider_err.to_string())),
            Err(join_err) => return Err(CallError::Task(join_err.to_string())),
        };

        if response.success {
            Ok(response.data.unwrap_or(Value::Null))
        } else {
            let (code, message) = match response.error {
                Some(e) => (e.code, e.message),
                None => (
                    "UNKNOWN".to_string(),
                    "provider reported failure without detail".to_string(),
                ),
            };
            Err(CallError::Rejected { code, message })
        }
    }

    /// Execute all calls concurrently.
    ///
    /// Outcomes arrive in completion order. A failing call never aborts its
    /// siblings; an empty input settles immediately as an all-succeeded
    /// batch without touching the runner.
    pub async fn execute_parallel(
        &self,
        calls: &[ToolCall],
        runner: &Arc<dyn CallRunner>,
        options: &ExecutionOptions,
    ) -> BatchOutcome {
        let started = Instant::now();
        if calls.is_empty() {
            return BatchOutcome::empty();
        }
        info!("executing {} call(s) in parallel", calls.len());

        let mut in_flight: FuturesUnordered<_> = calls
            .iter()
            .map(|call| self.execute(call, runner, options))
            .collect();

        let mut outcomes = Vec::with_capacity(calls.len());
        while let Some(outcome) = in_flight.next().await {
            outcomes.push(outcome);
        }

        let batch = BatchOutcome::collect(outcomes, started.elapsed());
        info!(
            "parallel batch finished in {:?}: {}/{} succeeded",
            batch.total_time,
            batch.data.len(),
            batch.outcomes.len()
        );
        batch
    }

    /// Execute calls one at a time, starting each only after the previous
    /// one settled. Outcomes are in input order.
    pub async fn execute_sequential(
        &self,
        calls: &[ToolCall],
        runner: &Arc<dyn CallRunner>,
        options: &ExecutionOptions,
    ) -> BatchOutcome {
        let started = Instant::now();
        if calls.is_empty() {
            return BatchOutcome::empty();
        }
        info!("executing {} call(s) sequentially", calls.len());

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            outcomes.push(self.execute(call, runner, options).await);
        }

        let batch = BatchOutcome::collect(outcomes, started.elapsed());
        info!(
            "sequential batch finished in {:?}: {}/{} succeeded",
            batch.total_time,
            batch.data.len(),
            batch.outcomes.len()
        );
        batch
    }

    /// Run the calls in parallel, then fold the successful payloads with
    /// `aggregator`.
    ///
    /// With zero successes the aggregator is never invoked and the outcome
    /// carries [`CallError::NoSuccesses`]. An aggregator error becomes
    /// [`CallError::Aggregation`].
    pub async fn execute_with_aggregation<F>(
        &self,
        calls: &[ToolCall],
        runner: &Arc<dyn CallRunner>,
        aggregator: F,
        options: &ExecutionOptions,
    ) -> CallOutcome
    where
        F: FnOnce(&[Value]) -> Result<Value, String>,
    {
        let started = Instant::now();
        let batch = self.execute_parallel(calls, runner, options).await;

        if batch.data.is_empty() {
            let summary = if batch.errors.is_empty() {
                "no calls to aggregate".to_string()
            } else {
                batch
                    .errors
                    .iter()
                    .map(|f| format!("{} ({})", f.server, f.error))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            warn!("aggregation skipped: no successful results ({})", summary);
            return Self::aggregate_outcome(Err(CallError::NoSuccesses(summary)), started.elapsed());
        }

        let result = match aggregator(&batch.data) {
            Ok(value) => Ok(value),
            Err(reason) => {
                warn!("aggregation failed: {}", reason);
                Err(CallError::Aggregation(reason))
            }
        };
        Self::aggregate_outcome(result, started.elapsed())
    }

    fn aggregate_outcome(result: Result<Value, CallError>, elapsed: Duration) -> CallOutcome {
        CallOutcome {
            call_id: "aggregate".to_string(),
            server: "aggregator".to_string(),
            method: "aggregate".to_string(),
            result,
            execution_time: elapsed,
            attempts: 1,
        }
    }
}
