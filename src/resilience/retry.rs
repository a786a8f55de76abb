// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry with exponential backoff for store operations.
//!
//! # Example
//!
//! ```
//! use confession_board::resilience::retry::RetryConfig;
//!
//! // Connecting: a handful of attempts so a bad URL surfaces quickly
//! let connect = RetryConfig::connect();
//! assert_eq!(connect.max_attempts, 5);
//!
//! // Queries: retry briefly, then hand the error to the caller
//! let query = RetryConfig::query();
//! assert_eq!(query.max_attempts, 3);
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts including the first (minimum 1)
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::query()
    }
}

impl RetryConfig {
    /// Initial store connection and schema setup (~5 seconds worst case).
    #[must_use]
    pub fn connect() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Individual reads and writes.
    #[must_use]
    pub fn query() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        delay.mul_f64(self.factor).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or `max_attempts` is reached.
/// The last error is returned unchanged.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        attempts += 1;
        match operation().await {
            Ok(val) => {
                if attempts > 1 {
                    info!(operation = operation_name, attempts, "Operation succeeded after retry");
                }
                return Ok(val);
            }
            Err(err) if attempts >= max_attempts => return Err(err),
            Err(err) => {
                warn!(
                    operation = operation_name,
                    attempt = attempts,
                    max_attempts,
                    error = %err,
                    retry_in = ?delay,
                    "Operation failed, retrying"
                );
                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
