//! Bounded retry with exponential backoff for completion calls.
//!
//! One completion attempt may fail transiently (network error, 5xx, rate
//! limit). The retry loop re-runs the attempt up to a fixed bound, doubling
//! the delay each time starting from a base delay. Quota exhaustion is
//! terminal and short-circuits the loop after a single attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Cap on the doubling exponent; beyond this the delay stays flat.
/// `max_attempts` is user-configurable, so unbounded shifts would overflow.
const MAX_BACKOFF_SHIFT: u32 = 20;

/// Retry policy for a single completion call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts (initial call included).
    pub max_attempts: u32,
    /// Delay before the first re-attempt; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Backoff delay applied before `attempt` (1-based re-attempt number).
    ///
    /// Delays double each re-attempt: base, 2*base, 4*base, ... The exponent
    /// is capped and the multiplication saturates, so an extreme attempt
    /// budget flattens the delay instead of panicking.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.base_delay.saturating_mul(1 << shift)
    }
}

/// Check if an error is transient and worth retrying.
///
/// Network-level failures and any non-2xx status are transient, with one
/// exception: quota exhaustion (mapped from HTTP 402 by the client) is
/// terminal. Malformed success bodies are not retried either, the server
/// already answered.
pub fn is_transient_error(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::RequestFailed(_) | LlmError::ApiError { .. }
    )
}

/// Run `op` with bounded retry and exponential backoff.
///
/// `op` receives the zero-based attempt number. Terminal errors are returned
/// immediately; once the attempt budget is exhausted the last transient error
/// is folded into [`LlmError::Unavailable`].
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            tokio::time::sleep(delay).await;
            tracing::debug!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Retrying completion after transient failure"
            );
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient_error(&err) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "Transient completion failure, will retry"
                );
                last_error = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(LlmError::Unavailable {
        attempts: policy.max_attempts,
        last_error: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error captured".to_string()),
    })
}
