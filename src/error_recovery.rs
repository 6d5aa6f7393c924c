// src/error_recovery.rs
//! Retry with linear backoff for transient network failures.

use crate::constants::{RETRY_BASE_DELAY, RETRY_MAX_ATTEMPTS};
use crate::error::AppError;
use std::future::Future;
use std::time::Duration;

/// How many times to try, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based): `base * attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
        }
    }
}

/// Runs `operation`, retrying while it fails with a transient error.
///
/// Non-transient errors are returned at once; after the last attempt the
/// last error is returned.
pub async fn retry_transient<F, T, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        log::debug!("{}: attempt {}/{}", operation_name, attempt, max_attempts);
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "{}: attempt {}/{} failed ({}), retrying after {:?}",
                    operation_name,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                log::error!(
                    "{}: giving up after attempt {}/{}: {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    e
                );
                return Err(e);
            }
        }
    }
}
