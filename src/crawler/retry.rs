//! Bounded exponential-backoff retry
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 2xx | Success → document |
//! | HTTP 403 | Immediate → `Payload::Denied`, never retried |
//! | Other status | Retry after `base * 2^attempt` |
//! | Transport error | Retry after `base * 2^attempt` |
//! | Attempts exhausted | `FetchError::Exhausted` |

use crate::crawler::fetcher::{FetchError, Payload, TransientFailure};
use crate::crawler::transport::{TransportError, TransportResponse};
use std::future::Future;
use std::time::Duration;

const FORBIDDEN: u16 = 403;

/// Retry settings shared by both endpoint classes
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` of zero is treated as one
    pub fn new(max_attempts: u32, base: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
            max_backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the failed attempt number `attempt` (counted from 0)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_backoff)
    }

    /// Runs `op` until it succeeds, is denied, or attempts run out
    ///
    /// `op` receives the attempt number and performs one complete request,
    /// rate limiting included, so every retry is admitted again.
    pub async fn run<F, Fut>(&self, label: &str, mut op: F) -> Result<Payload, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<TransportResponse, TransportError>>,
    {
        let mut attempt = 0;

        loop {
            let failure = match op(attempt).await {
                Ok(response) if response.is_success() => {
                    return Ok(Payload::Document {
                        body: response.body,
                        elapsed: response.elapsed,
                    });
                }
                Ok(response) if response.status == FORBIDDEN => {
                    tracing::debug!("{}: access denied (HTTP 403)", label);
                    return Ok(Payload::Denied);
                }
                Ok(response) => TransientFailure::Status(response.status),
                Err(e) => TransientFailure::Transport(e.to_string()),
            };

            let attempts = attempt + 1;
            if attempts >= self.max_attempts {
                tracing::error!(
                    "{}: giving up after {} attempts, last failure: {}",
                    label,
                    attempts,
                    failure
                );
                return Err(FetchError::Exhausted {
                    attempts,
                    last: failure,
                });
            }

            let delay = self.backoff(attempt);
            tracing::warn!(
                "{}: attempt {}/{} failed ({}), retrying in {:?}",
                label,
                attempts,
                self.max_attempts,
                failure,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
