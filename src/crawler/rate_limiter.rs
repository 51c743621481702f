//! Sliding-window request limiter
//!
//! Admits at most `calls` requests within any trailing `period`. Callers
//! queue on a fair async mutex, so waiters are admitted in arrival order and
//! none can starve.

use crate::config::EndpointLimit;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Call ceiling for one endpoint class
#[derive(Debug)]
pub struct RateLimiter {
    calls: usize,
    period: Duration,
    /// Admission times still inside the window, oldest first
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter admitting `calls` requests per `period`
    ///
    /// A `calls` of zero is treated as one.
    pub fn new(calls: u32, period: Duration) -> Self {
        let calls = calls.max(1) as usize;
        Self {
            calls,
            period,
            admitted: Mutex::new(VecDeque::with_capacity(calls)),
        }
    }

    pub fn from_limit(limit: &EndpointLimit) -> Self {
        Self::new(limit.calls, limit.period())
    }

    /// Waits until one more call fits in the window, then records it
    ///
    /// Never fails; the only effect is the delay. The lock is held while
    /// sleeping so later callers queue behind the current one.
    pub async fn acquire(&self) {
        let mut admitted = self.admitted.lock().await;

        loop {
            let now = Instant::now();
            while admitted
                .front()
                .is_some_and(|oldest| now.duration_since(*oldest) >= self.period)
            {
                admitted.pop_front();
            }

            if admitted.len() < self.calls {
                admitted.push_back(now);
                return;
            }

            if let Some(oldest) = admitted.front().copied() {
                let wait = self.period.saturating_sub(now.duration_since(oldest));
                tracing::trace!("Rate limit reached, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}
