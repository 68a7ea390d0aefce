//! Service configuration.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::retry::RetryConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Configuration for the membership services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Whether committed commands publish membership events.
    pub publish_events: bool,

    /// Buffer size of each event subscription channel.
    pub event_channel_capacity: usize,

    /// Attempts (including the first) callers make on transient storage failures.
    pub retry_max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    pub retry_initial_delay_ms: u64,

    /// Upper bound for the backoff delay, in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            publish_events: true,
            event_channel_capacity: 1024,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TENANCY_PUBLISH_EVENTS`: Publish membership events (default: true)
    /// - `TENANCY_EVENT_CHANNEL_CAPACITY`: Subscription buffer size (default: 1024)
    /// - `TENANCY_RETRY_MAX_ATTEMPTS`: Attempts on transient failures (default: 3)
    /// - `TENANCY_RETRY_INITIAL_DELAY_MS`: First backoff delay (default: 100)
    /// - `TENANCY_RETRY_MAX_DELAY_MS`: Backoff cap (default: 5000)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            publish_events: std::env::var("TENANCY_PUBLISH_EVENTS")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.publish_events),
            event_channel_capacity: env_parse("TENANCY_EVENT_CHANNEL_CAPACITY")
                .unwrap_or(default.event_channel_capacity),
            retry_max_attempts: env_parse("TENANCY_RETRY_MAX_ATTEMPTS")
                .unwrap_or(default.retry_max_attempts),
            retry_initial_delay_ms: env_parse("TENANCY_RETRY_INITIAL_DELAY_MS")
                .unwrap_or(default.retry_initial_delay_ms),
            retry_max_delay_ms: env_parse("TENANCY_RETRY_MAX_DELAY_MS")
                .unwrap_or(default.retry_max_delay_ms),
        }
    }

    /// Check the values make sense together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TENANCY_EVENT_CHANNEL_CAPACITY".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TENANCY_RETRY_MAX_ATTEMPTS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(ConfigError::InvalidValue {
                key: "TENANCY_RETRY_INITIAL_DELAY_MS".to_string(),
                message: "must not exceed TENANCY_RETRY_MAX_DELAY_MS".to_string(),
            });
        }
        Ok(())
    }

    /// Retry policy for callers of the command service.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry_max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            exponential_base: 2.0,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
