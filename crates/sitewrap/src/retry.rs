//! Retry with exponential backoff for transient tool failures.
//!
//! Only failures for which [`ToolError::is_retryable`] holds are retried:
//! non-zero exits, spawn faults, and timeouts. Validation failures are
//! deterministic and a tripped breaker needs an explicit `connect()`, so
//! both return immediately.

use crate::error::ToolError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first (1 = no retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Whether to scale delays down by a deterministic jitter factor.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// A config that runs the operation exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            max_attempts: attempts.max(1),
            ..Default::default()
        }
    }

    /// Calculate the delay after a given failed attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());

        if self.jitter {
            // Fixed per-attempt factors keep delays reproducible in tests.
            let jitter_factor = match attempt % 4 {
                0 => 0.75,
                1 => 0.90,
                2 => 0.60,
                _ => 0.85,
            };
            Duration::from_secs_f64(capped * jitter_factor)
        } else {
            Duration::from_secs_f64(capped)
        }
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent.
pub async fn with_retry<T, F, Fut>(config: &RetryConfig, label: &str, mut op: F) -> Result<T, ToolError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ToolError>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    "{label} failed ({} error, attempt {}/{attempts}), retrying in {}ms: {e}",
                    e.kind().as_str(),
                    attempt + 1,
                    delay.as_millis(),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
