//! Global completion-call rate limiting.
//!
//! One [`RateLimiter`] is shared by every worker in a run. It bounds the
//! number of completion calls in flight with a semaphore and holds each slot
//! through a fixed pacing delay before the call is issued, so a burst of
//! workers cannot stampede the API.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared limiter for completion calls across all workers.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Bounds calls in flight across the whole run.
    semaphore: Arc<Semaphore>,
    /// Pacing delay applied while holding a freshly acquired slot.
    inter_call_delay: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing at most `max_in_flight` concurrent calls.
    pub fn new(max_in_flight: usize, inter_call_delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight)),
            inter_call_delay,
        }
    }

    /// Acquire one call slot, waiting if all slots are taken.
    ///
    /// The pacing delay elapses while the slot is held, so the delay itself
    /// counts against the in-flight bound. Dropping the returned permit
    /// releases the slot.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("rate limiter semaphore closed");

        if !self.inter_call_delay.is_zero() {
            tokio::time::sleep(self.inter_call_delay).await;
        }

        permit
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
