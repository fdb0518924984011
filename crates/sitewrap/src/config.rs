//! Framework-wide execution settings.

use crate::lifecycle::DEFAULT_BREAKER_THRESHOLD;
use crate::retry::RetryConfig;
use crate::runner::{CommandRunner, DEFAULT_MAX_OUTPUT_BYTES, ProcessRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Settings shared by every adapter built from the same configuration.
///
/// Defaults: 120 s tool timeout, 10 s probe timeout, three attempts with
/// 100 ms doubling backoff capped at 10 s, breaker after three failed
/// probes, 1 MiB per captured stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkConfig {
    /// Time limit for a tool invocation.
    pub timeout: Duration,
    /// Time limit for a lifecycle probe.
    pub probe_timeout: Duration,
    pub retry: RetryConfig,
    /// Consecutive failed probes before the adapter is reported fatal.
    pub breaker_threshold: u32,
    /// Cap on each captured output stream.
    pub max_output_bytes: usize,
    /// Base working directory for tools. `None` inherits the process cwd.
    pub workdir: Option<PathBuf>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            timeout: crate::DEFAULT_TIMEOUT,
            probe_timeout: crate::DEFAULT_PROBE_TIMEOUT,
            retry: RetryConfig::default(),
            breaker_threshold: DEFAULT_BREAKER_THRESHOLD,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            workdir: None,
        }
    }
}

impl FrameworkConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker_threshold(mut self, threshold: u32) -> Self {
        self.breaker_threshold = threshold;
        self
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Build the process runner these settings describe.
    pub fn build_runner(&self) -> Arc<dyn CommandRunner> {
        Arc::new(ProcessRunner::new().with_max_output_bytes(self.max_output_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_policy() {
        let config = FrameworkConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.breaker_threshold, 3);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.workdir.is_none());
    }

    #[test]
    fn builders_override() {
        let config = FrameworkConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_breaker_threshold(1)
            .with_workdir("/srv/site");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.breaker_threshold, 1);
        assert_eq!(config.workdir, Some(PathBuf::from("/srv/site")));
    }
}
