//! The uniform result shape returned by every tool operation.
//!
//! [`ToolResult`] is the wire contract consumed by the orchestrating hub:
//! `{success, stdout, stderr, code}`. It is produced from a
//! `Result<ProcessOutput, ToolError>` and nowhere else, which keeps two
//! properties true for every path:
//!
//! - `success == true` implies `code == 0`.
//! - `success == false` carries a non-empty `stderr`.

use crate::error::ToolError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Exit code reported when no process exit code exists (validation
/// failures, spawn failures, timeouts, tripped breakers).
pub const SENTINEL_CODE: i32 = 1;

/// Structured outcome of a tool operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolResult {
    /// Whether the operation completed successfully.
    pub success: bool,
    /// Captured standard output of the wrapped tool.
    pub stdout: String,
    /// Captured standard error, or a description of why the operation failed.
    pub stderr: String,
    /// Process exit code, or 1 when the failure happened before or outside
    /// a process exit.
    pub code: i32,
}

impl ToolResult {
    pub fn ok(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: stderr.into(),
            code: 0,
        }
    }

    /// A failed result. A zero `code` becomes [`SENTINEL_CODE`] and an empty
    /// `stderr` is replaced with a generic description.
    pub fn failure(stdout: impl Into<String>, stderr: impl Into<String>, code: i32) -> Self {
        let code = if code == 0 { SENTINEL_CODE } else { code };
        let mut stderr = stderr.into();
        if stderr.trim().is_empty() {
            stderr = format!("process exited with code {code}");
        }
        Self {
            success: false,
            stdout: stdout.into(),
            stderr,
            code,
        }
    }
}

/// Captured output of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Treat exit code 0 and any of `lenient_exit_codes` as success; anything
    /// else becomes [`ToolError::Execution`].
    pub fn check(self, lenient_exit_codes: &[i32]) -> Result<Self, ToolError> {
        if self.code == 0 || lenient_exit_codes.contains(&self.code) {
            Ok(self)
        } else {
            Err(ToolError::Execution {
                code: self.code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

impl From<Result<ProcessOutput, ToolError>> for ToolResult {
    fn from(outcome: Result<ProcessOutput, ToolError>) -> Self {
        match outcome {
            Ok(out) if out.code == 0 => ToolResult::ok(out.stdout, out.stderr),
            Ok(out) => ToolResult::failure(out.stdout, out.stderr, out.code),
            Err(ToolError::Execution {
                code,
                stdout,
                stderr,
            }) => ToolResult::failure(stdout, stderr, code),
            Err(other) => ToolResult::failure(String::new(), other.to_string(), SENTINEL_CODE),
        }
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        Err::<ProcessOutput, _>(err).into()
    }
}

/// Exit code of a finished process. Signal terminations report
/// `128 + signal` on unix, mirroring shell convention.
pub fn exit_code(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    SENTINEL_CODE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use std::time::Duration;

    #[test]
    fn success_keeps_streams() {
        let result = ToolResult::from(Ok(ProcessOutput {
            code: 0,
            stdout: "built 12 pages".into(),
            stderr: "warning: draft skipped".into(),
        }));
        assert!(result.success);
        assert_eq!(result.code, 0);
        assert_eq!(result.stdout, "built 12 pages");
        assert_eq!(result.stderr, "warning: draft skipped");
    }

    #[test]
    fn validation_failure_uses_sentinel() {
        let err = ToolError::from(ValidationError::new("port", "must be between 1 and 65535"));
        let result = ToolResult::from(err);
        assert!(!result.success);
        assert_eq!(result.code, SENTINEL_CODE);
        assert!(result.stderr.contains("port"));
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn execution_failure_keeps_real_code_and_streams() {
        let result = ToolResult::from(Err(ToolError::Execution {
            code: 255,
            stdout: "partial".into(),
            stderr: "template error".into(),
        }));
        assert!(!result.success);
        assert_eq!(result.code, 255);
        assert_eq!(result.stdout, "partial");
        assert_eq!(result.stderr, "template error");
    }

    #[test]
    fn silent_failure_gets_described() {
        let result = ToolResult::from(Err(ToolError::Execution {
            code: 3,
            stdout: String::new(),
            stderr: "  \n".into(),
        }));
        assert_eq!(result.stderr, "process exited with code 3");
    }

    #[test]
    fn nonzero_output_is_never_success() {
        let result = ToolResult::from(Ok(ProcessOutput {
            code: 4,
            ..Default::default()
        }));
        assert!(!result.success);
        assert_eq!(result.code, 4);
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn failure_never_reports_zero() {
        let result = ToolResult::failure("", "odd", 0);
        assert_eq!(result.code, SENTINEL_CODE);
    }

    #[test]
    fn timeout_is_described() {
        let result = ToolResult::from(ToolError::Timeout {
            program: "hugo".into(),
            after: Duration::from_secs(120),
        });
        assert_eq!(result.code, SENTINEL_CODE);
        assert!(result.stderr.contains("timed out"));
    }

    #[test]
    fn lenient_codes_pass_check() {
        let out = ProcessOutput {
            code: 1,
            ..Default::default()
        };
        assert!(out.clone().check(&[1]).is_ok());
        assert!(matches!(
            out.check(&[]),
            Err(ToolError::Execution { code: 1, .. })
        ));
    }

    #[test]
    fn wire_shape_field_names() {
        let json = serde_json::to_value(ToolResult::ok("a", "")).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["code", "stderr", "stdout", "success"]);
        assert_eq!(json["code"], 0);
        assert_eq!(json["success"], true);
    }
}
