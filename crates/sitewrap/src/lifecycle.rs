//! Per-adapter connection lifecycle with a probe circuit breaker.
//!
//! States: `disconnected → connecting → connected | error`. A probe (usually
//! the wrapped binary's `--version`) decides between `connected` and
//! `error`. Consecutive failed probes are counted; once the count reaches the
//! breaker threshold the adapter is reported as fatally unavailable and
//! implicit re-probes stop until the caller connects explicitly.
//!
//! State lives behind a short-held mutex and is never locked across an
//! await. Probes are serialized by a separate async mutex. `disconnect()`
//! bumps a generation counter so a probe that finishes after a disconnect
//! cannot resurrect the connection. A `connect()` future dropped before its
//! probe settles puts the state back where it was.

use crate::error::ToolError;
use crate::retry::RetryConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Consecutive failed probes after which the breaker opens.
pub const DEFAULT_BREAKER_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to check that an adapter's binary is usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSpec {
    /// Program to probe instead of the adapter binary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub args: Vec<String>,
    /// Exit codes besides 0 that still prove the binary runs.
    pub lenient_exit_codes: Vec<i32>,
}

impl Default for ProbeSpec {
    fn default() -> Self {
        Self::args(["--version"])
    }
}

impl ProbeSpec {
    pub fn args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: None,
            args: args.into_iter().map(Into::into).collect(),
            lenient_exit_codes: Vec::new(),
        }
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn lenient(mut self, codes: &[i32]) -> Self {
        self.lenient_exit_codes = codes.to_vec();
        self
    }
}

/// Point-in-time view of a lifecycle, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleStatus {
    pub state: LifecycleState,
    pub consecutive_failures: u32,
    pub breaker_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_probe_at: Option<DateTime<Utc>>,
}

impl LifecycleStatus {
    /// How long a caller should wait before the next `connect()`, following
    /// the backoff curve. Zero when the last probe did not fail.
    pub fn suggested_reprobe_delay(&self, retry: &RetryConfig) -> Duration {
        match self.consecutive_failures {
            0 => Duration::ZERO,
            n => retry.delay_for_attempt(n - 1),
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: LifecycleState,
    consecutive_failures: u32,
    generation: u64,
    last_error: Option<String>,
    last_probe_at: Option<DateTime<Utc>>,
}

/// The lifecycle of one adapter.
#[derive(Debug)]
pub struct Lifecycle {
    adapter: String,
    breaker_threshold: u32,
    inner: Mutex<Inner>,
    probe_lock: tokio::sync::Mutex<()>,
}

impl Lifecycle {
    pub fn new(adapter: impl Into<String>, breaker_threshold: u32) -> Self {
        Self {
            adapter: adapter.into(),
            breaker_threshold: breaker_threshold.max(1),
            inner: Mutex::new(Inner {
                state: LifecycleState::Disconnected,
                consecutive_failures: 0,
                generation: 0,
                last_error: None,
                last_probe_at: None,
            }),
            probe_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LifecycleState::Connected
    }

    /// Whether enough consecutive probes failed to open the breaker.
    pub fn is_tripped(&self) -> bool {
        self.lock().consecutive_failures >= self.breaker_threshold
    }

    pub fn status(&self) -> LifecycleStatus {
        let inner = self.lock();
        LifecycleStatus {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            breaker_open: inner.consecutive_failures >= self.breaker_threshold,
            last_error: inner.last_error.clone(),
            last_probe_at: inner.last_probe_at,
        }
    }

    /// Run `probe` and record its outcome.
    ///
    /// Already connected: returns immediately without probing. Otherwise the
    /// state moves to `connecting` for the duration of the probe. A failure
    /// that reaches the breaker threshold is reported as
    /// [`ToolError::Fatal`].
    pub async fn connect<F>(&self, probe: F) -> Result<(), ToolError>
    where
        F: Future<Output = Result<(), ToolError>>,
    {
        let _probing = self.probe_lock.lock().await;

        let mut attempt = {
            let mut inner = self.lock();
            if inner.state == LifecycleState::Connected {
                return Ok(());
            }
            debug!("[{}] {} -> connecting", self.adapter, inner.state);
            let attempt = ConnectAttempt {
                lifecycle: self,
                previous: inner.state,
                generation: inner.generation,
                armed: true,
            };
            inner.state = LifecycleState::Connecting;
            attempt
        };

        let outcome = probe.await;
        attempt.armed = false;
        let generation = attempt.generation;

        let mut inner = self.lock();
        inner.last_probe_at = Some(Utc::now());
        if inner.generation != generation {
            debug!("[{}] probe finished after disconnect, discarded", self.adapter);
            return Err(ToolError::System {
                program: self.adapter.clone(),
                reason: "connection attempt was cancelled by disconnect".to_string(),
            });
        }
        match outcome {
            Ok(()) => {
                info!("[{}] connected", self.adapter);
                inner.state = LifecycleState::Connected;
                inner.consecutive_failures = 0;
                inner.last_error = None;
                Ok(())
            }
            Err(e) => {
                inner.state = LifecycleState::Error;
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                inner.last_error = Some(e.to_string());
                let failures = inner.consecutive_failures;
                if failures >= self.breaker_threshold {
                    warn!(
                        "[{}] probe failed {failures} times in a row, breaker open: {e}",
                        self.adapter
                    );
                    Err(ToolError::Fatal {
                        adapter: self.adapter.clone(),
                        failures,
                    })
                } else {
                    warn!("[{}] probe failed ({failures}): {e}", self.adapter);
                    Err(e)
                }
            }
        }
    }

    /// Return to `disconnected` from any state, forgetting the availability
    /// judgment and the failure count.
    pub fn disconnect(&self) {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Disconnected {
            debug!("[{}] {} -> disconnected", self.adapter, inner.state);
        }
        inner.state = LifecycleState::Disconnected;
        inner.generation = inner.generation.wrapping_add(1);
        inner.consecutive_failures = 0;
        inner.last_error = None;
    }
}

/// Puts the state back if `connect()` is dropped before its outcome is
/// recorded.
struct ConnectAttempt<'a> {
    lifecycle: &'a Lifecycle,
    previous: LifecycleState,
    generation: u64,
    armed: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.lifecycle.lock();
        if inner.state == LifecycleState::Connecting && inner.generation == self.generation {
            debug!(
                "[{}] connect abandoned, back to {}",
                self.lifecycle.adapter, self.previous
            );
            inner.state = self.previous;
        }
    }
}
