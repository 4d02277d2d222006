//! Execution options and retry policy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::CallError;

/// Default per-attempt timeout (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Predicate deciding whether a failed attempt should be retried.
pub type RetryPredicate = Arc<dyn Fn(&CallError) -> bool + Send + Sync>;

/// Retry policy with exponential backoff.
#[derive(Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Optional predicate; `None` retries every failure.
    pub retry_on: Option<RetryPredicate>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            retry_on: None,
        }
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("max_delay", &self.max_delay)
            .field("retry_on", &self.retry_on.as_ref().map(|_| "<predicate>"))
            .finish()
    }
}

impl RetryConfig {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the retry that follows `attempt` (1-based):
    /// `min(initial_delay * backoff_multiplier^(attempt - 1), max_delay)`.
    ///
    /// The value is clamped before the `Duration` is built, so outsized
    /// multipliers saturate at `max_delay` instead of panicking.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let raw = self.initial_delay.as_secs_f64() * factor;
        let capped = raw.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    /// Whether `error` qualifies for another attempt under this policy.
    pub fn should_retry(&self, error: &CallError) -> bool {
        match &self.retry_on {
            Some(predicate) => predicate(error),
            None => true,
        }
    }

    /// Restrict retries to transient failures.
    pub fn transient_only(mut self) -> Self {
        self.retry_on = Some(Arc::new(CallError::is_transient));
        self
    }
}

/// Options governing one execution request.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Per-attempt time limit. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub retry: RetryConfig,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            retry: RetryConfig::default(),
        }
    }
}

impl ExecutionOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for each attempt.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
