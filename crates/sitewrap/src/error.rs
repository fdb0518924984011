//! Error taxonomy for validated tool execution.
//!
//! Every failure a tool operation can produce is a [`ToolError`]. The single
//! conversion into the wire shape lives in [`crate::result`], so validation
//! failures, non-zero exits, spawn faults, and timeouts all travel the same
//! path. [`RegistrationError`] is the one exception: it reports malformed
//! tool or adapter definitions at startup and is never turned into a result.

use std::time::Duration;
use thiserror::Error;

/// A rejected parameter, detected before anything is executed.
///
/// `reason` describes what is wrong with the value without repeating it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {param}: {reason}")]
pub struct ValidationError {
    /// Parameter name (or the validator category when no name is known yet).
    pub param: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl ValidationError {
    pub fn new(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Re-label the error with the parameter it was raised for.
    pub fn named(mut self, param: &str) -> Self {
        self.param = param.to_string();
        self
    }
}

/// Coarse classification of a [`ToolError`], used for logging and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Execution,
    System,
    Fatal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Execution => "execution",
            Self::System => "system",
            Self::Fatal => "fatal",
        }
    }
}

/// Failure of a single tool invocation or lifecycle probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Bad or dangerous input. The runner was never reached.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The process ran and exited unsuccessfully.
    #[error("process exited with code {code}")]
    Execution {
        code: i32,
        stdout: String,
        stderr: String,
    },

    /// The process could not be started or waited on.
    #[error("failed to run {program}: {reason}")]
    System { program: String, reason: String },

    /// The process exceeded its time limit and was killed.
    #[error("{program} timed out after {} and was terminated", limit(*after))]
    Timeout { program: String, after: Duration },

    /// Repeated probe failures tripped the adapter's breaker.
    #[error(
        "adapter '{adapter}' is unavailable after {failures} failed probes; \
         call connect() before retrying"
    )]
    Fatal { adapter: String, failures: u32 },

    /// The adapter has no tool with this name.
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::UnknownTool { .. } => ErrorKind::Validation,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::System { .. } | Self::Timeout { .. } => ErrorKind::System,
            Self::Fatal { .. } => ErrorKind::Fatal,
        }
    }

    /// Whether re-running the same invocation could plausibly succeed.
    ///
    /// Validation is deterministic and a tripped breaker needs an explicit
    /// `connect()`, so only execution and system failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Execution | ErrorKind::System)
    }
}

/// A malformed tool or adapter definition, reported at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("duplicate tool name '{0}'")]
    DuplicateTool(String),

    #[error("duplicate adapter name '{0}'")]
    DuplicateAdapter(String),

    #[error("tool '{tool}': parameter '{param}' is declared more than once")]
    DuplicateParameter { tool: String, param: String },

    #[error("tool '{tool}': argument template references undeclared parameter '{param}'")]
    UndeclaredParameter { tool: String, param: String },

    #[error("tool '{tool}': {reason}")]
    InvalidTool { tool: String, reason: String },

    #[error("adapter '{adapter}': {reason}")]
    InvalidAdapter { adapter: String, reason: String },
}

/// Render a time limit for messages: milliseconds below one second, whole
/// seconds otherwise.
fn limit(after: Duration) -> String {
    if after < Duration::from_secs(1) {
        format!("{}ms", after.as_millis())
    } else {
        format!("{}s", after.as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_execution_and_system_failures_retry() {
        let execution = ToolError::Execution {
            code: 2,
            stdout: String::new(),
            stderr: "boom".into(),
        };
        let system = ToolError::System {
            program: "hugo".into(),
            reason: "executable not found".into(),
        };
        let timeout = ToolError::Timeout {
            program: "hugo".into(),
            after: Duration::from_secs(1),
        };
        assert!(execution.is_retryable());
        assert!(system.is_retryable());
        assert!(timeout.is_retryable());

        let validation = ToolError::from(ValidationError::new("port", "out of range"));
        let fatal = ToolError::Fatal {
            adapter: "hugo".into(),
            failures: 3,
        };
        let unknown = ToolError::UnknownTool {
            name: "deploy".into(),
        };
        assert!(!validation.is_retryable());
        assert!(!fatal.is_retryable());
        assert!(!unknown.is_retryable());
    }

    #[test]
    fn validation_message_names_parameter() {
        let err = ValidationError::new("path", "contains '..'").named("source");
        assert_eq!(err.to_string(), "invalid source: contains '..'");
    }

    #[test]
    fn timeout_message_is_whole_seconds() {
        let err = ToolError::Timeout {
            program: "zola".into(),
            after: Duration::from_millis(120_400),
        };
        assert_eq!(
            err.to_string(),
            "zola timed out after 120s and was terminated"
        );
    }

    #[test]
    fn sub_second_timeout_message_uses_milliseconds() {
        let err = ToolError::Timeout {
            program: "hugo".into(),
            after: Duration::from_millis(500),
        };
        assert_eq!(
            err.to_string(),
            "hugo timed out after 500ms and was terminated"
        );
    }
}
