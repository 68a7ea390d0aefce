//! Caller-side retry with exponential backoff.
//!
//! Commands never retry internally. Callers that want to ride out transient
//! storage failures wrap a command in [`with_retry`]; conflicts, missing
//! entities, validation failures and invalid transitions are returned on the
//! first attempt because running the command again cannot change them.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenancy_service::retry::{with_retry, RetryConfig};
//! use tenancy_service::ServiceResult;
//!
//! async fn example() -> ServiceResult<u32> {
//!     with_retry(&RetryConfig::fast(), || async {
//!         // Your command here
//!         Ok(42)
//!     })
//!     .await
//! }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::ServiceResult;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Initial delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Base for exponential backoff (typically 2.0)
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Short delays, for in-process stores.
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
            exponential_base: 2.0,
        }
    }

    /// A configuration that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_base: 1.0,
        }
    }

    /// Backoff that follows a wait of `current`.
    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.exponential_base).min(self.max_delay)
    }
}

/// Execute a command, retrying transient storage failures.
///
/// # Returns
///
/// The first success, the first non-retryable error, or the last error once
/// `max_attempts` is reached.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut f: F) -> ServiceResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ServiceResult<T>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Command succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= config.max_attempts => {
                tracing::error!(
                    attempts = attempt,
                    error = %e,
                    "All retry attempts exhausted"
                );
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );

                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
