//! Retry policy for remote backend attempts.
//!
//! Each remote put variant runs under a [`RetryPolicy`] before its failure
//! surfaces to the orchestrator. Backoff is exponential:
//! `base_delay * 2^(attempt-1)`. Retries are skipped entirely for
//! non-retryable classifications (credentials, payload size, quota).

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::UploadError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 2 means up to 3 attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries (used by the simple fallback variant).
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before the given retry attempt (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds, a non-retryable error surfaces, or the
    /// retry budget is exhausted. Returns the last error in the failure case.
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, UploadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UploadError>>,
    {
        let total_attempts = self.max_retries + 1;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < total_attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        op = %op_name,
                        attempt = attempt,
                        total_attempts = total_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
