//! Safe process execution.
//!
//! [`CommandRunner`] is the seam between validated tools and the operating
//! system. [`ProcessRunner`] spawns the program directly with an argument
//! vector (there is no shell anywhere in this crate), captures both streams,
//! and enforces the time limit by killing the child's whole process group
//! and reaping the child. Descendants never outlive an invocation. Spawn
//! failures and timeouts come back as [`ToolError`] values rather than
//! panics or raw I/O errors.
//!
//! [`RecordingRunner`] records commands instead of running them. It backs
//! dry runs and lets tests assert that rejected input never reached a
//! process.

use crate::error::ToolError;
use crate::result::{ProcessOutput, ToolResult, exit_code};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, trace, warn};

/// Boxed future returned by [`CommandRunner::run`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<ProcessOutput, ToolError>> + Send + 'a>>;

/// Default cap on each captured stream (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

// ── CommandSpec ────────────────────────────────────────────────────

/// A fully-rendered command: program, discrete arguments, and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            timeout: crate::DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The program's file name, used in caller-facing messages so host
    /// paths are not disclosed.
    pub fn display_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string())
    }
}

// ── CommandRunner trait ────────────────────────────────────────────

/// Executes rendered commands.
///
/// `Ok` means the process ran to completion, whatever its exit code.
/// Non-zero codes are turned into [`ToolError::Execution`] by the caller
/// via [`ProcessOutput::check`].
pub trait CommandRunner: Send + Sync {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a>;
}

// ── ProcessRunner ──────────────────────────────────────────────────

/// Runs commands as real child processes on the tokio runtime.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    max_output_bytes: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Cap each captured stream at `max` bytes. The rest is drained and
    /// discarded so the child never blocks on a full pipe.
    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Run a command and convert the outcome into a [`ToolResult`].
    pub async fn execute(&self, spec: &CommandSpec) -> ToolResult {
        self.run(spec).await.and_then(|out| out.check(&[])).into()
    }

    async fn run_process(&self, spec: &CommandSpec) -> Result<ProcessOutput, ToolError> {
        let name = spec.display_name();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so launcher scripts and their children can be
        // terminated together.
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| spawn_error(spec, &name, &e))?;
        let group = ProcessGroup::new(child.id());

        let max = self.max_output_bytes;
        let stdout_buf = Capture::default();
        let stderr_buf = Capture::default();
        let mut stdout_task = tokio::spawn(read_capped(child.stdout.take(), max, stdout_buf.clone()));
        let mut stderr_task = tokio::spawn(read_capped(child.stderr.take(), max, stderr_buf.clone()));

        let waited = tokio::time::timeout(spec.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!("waiting on {} failed: {e}", spec.program);
                group.kill();
                stdout_task.abort();
                stderr_task.abort();
                // Reap whatever is left.
                let _ = child.kill().await;
                return Err(ToolError::System {
                    program: name,
                    reason: "lost track of the running process".to_string(),
                });
            }
            Err(_) => {
                warn!(
                    "{name} exceeded {:.1}s, terminating",
                    spec.timeout.as_secs_f64()
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    warn!("failed to kill {name}: {e}");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Err(ToolError::Timeout {
                    program: name,
                    after: spec.timeout,
                });
            }
        };

        // The exit status is final. Descendants may still hold the pipes,
        // so the readers only get a bounded window to reach end of file.
        let drained = tokio::time::timeout(OUTPUT_GRACE, async {
            let _ = (&mut stdout_task).await;
            let _ = (&mut stderr_task).await;
        })
        .await;
        if drained.is_err() {
            debug!("{name} exited but left its output pipes open, terminating leftovers");
            group.kill();
            stdout_task.abort();
            stderr_task.abort();
        }

        let code = exit_code(status);
        let stdout = stdout_buf.text();
        let stderr = stderr_buf.text();
        debug!(
            "{name} exited with {code} in {:.0}ms ({} + {} bytes)",
            start.elapsed().as_secs_f64() * 1000.0,
            stdout.len(),
            stderr.len(),
        );
        Ok(ProcessOutput {
            code,
            stdout,
            stderr,
        })
    }
}

/// How long captured streams may stay open after the process exits.
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a> {
        Box::pin(self.run_process(spec))
    }
}

fn spawn_error(spec: &CommandSpec, name: &str, err: &std::io::Error) -> ToolError {
    warn!("failed to spawn {}: {err}", spec.program);
    let reason = match err.kind() {
        std::io::ErrorKind::NotFound => "executable not found".to_string(),
        std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => "the process could not be started".to_string(),
    };
    ToolError::System {
        program: name.to_string(),
        reason,
    }
}

// ── Process group ──────────────────────────────────────────────────

/// The process group led by a spawned child. Killed when dropped, so no
/// descendant outlives the invocation, including when the caller drops the
/// future mid-run.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|p| i32::try_from(p).ok()).filter(|p| *p > 0),
        }
    }

    #[cfg(unix)]
    fn kill(&self) {
        let Some(pgid) = self.pgid else { return };
        // SAFETY: kill(2) takes no pointers; a negative pid addresses the
        // group this runner created.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc != 0 {
            trace!("process group {pgid} already gone");
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

// ── Output capture ─────────────────────────────────────────────────

/// Bytes read from one stream so far. Shared with the reader task, so a
/// partial capture survives aborting the reader.
#[derive(Debug, Clone, Default)]
struct Capture(Arc<Mutex<CaptureBuf>>);

#[derive(Debug, Default)]
struct CaptureBuf {
    kept: Vec<u8>,
    total: usize,
}

impl Capture {
    fn lock(&self) -> std::sync::MutexGuard<'_, CaptureBuf> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, bytes: &[u8], max: usize) {
        let mut buf = self.lock();
        buf.total += bytes.len();
        let room = max.saturating_sub(buf.kept.len());
        buf.kept.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn text(&self) -> String {
        let buf = self.lock();
        let mut text = String::from_utf8_lossy(&buf.kept).into_owned();
        if buf.total > buf.kept.len() {
            text.push_str(&format!("\n[truncated: {} bytes total]", buf.total));
        }
        text
    }
}

async fn read_capped<R>(reader: Option<R>, max: usize, sink: Capture)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink.push(&buf[..n], max),
        }
    }
}

// ── RecordingRunner ────────────────────────────────────────────────

/// A runner that records each command and answers with a canned output
/// instead of spawning anything.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    response: ProcessOutput,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command with `response`.
    pub fn responding(response: ProcessOutput) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            response,
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    pub fn last(&self) -> Option<CommandSpec> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CommandSpec>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl CommandRunner for RecordingRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a> {
        self.lock().push(spec.clone());
        let response = self.response.clone();
        Box::pin(async move { Ok(response) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = ProcessRunner::new();
        let out = runner
            .run(&CommandSpec::new("echo").args(["hello", "world"]))
            .await
            .unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(out.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let runner = ProcessRunner::new();
        let out = runner
            .run(&CommandSpec::new("echo").arg("$(id); `id`"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "$(id); `id`");
    }

    #[tokio::test]
    async fn nonzero_exit_is_execution_failure() {
        let result = ProcessRunner::new().execute(&CommandSpec::new("false")).await;
        assert!(!result.success);
        assert_eq!(result.code, 1);
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_system_error_without_path() {
        let spec = CommandSpec::new("/opt/secret/bin/definitely-not-installed-xyz");
        let err = ProcessRunner::new().run(&spec).await.unwrap_err();
        match &err {
            ToolError::System { program, reason } => {
                assert_eq!(program, "definitely-not-installed-xyz");
                assert_eq!(reason, "executable not found");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!err.to_string().contains("/opt/secret"));
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let out = ProcessRunner::new()
            .run(&CommandSpec::new("ls").cwd(dir.path()))
            .await
            .unwrap();
        assert!(out.stdout.contains("marker.txt"));
    }

    #[tokio::test]
    async fn timeout_returns_failure() {
        let spec = CommandSpec::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100));
        let start = Instant::now();
        let result = ProcessRunner::new().execute(&spec).await;
        assert!(start.elapsed() < Duration::from_secs(4));
        assert!(!result.success);
        assert!(result.stderr.contains("timed out"));
        assert_eq!(result.code, 1);
    }

    #[tokio::test]
    async fn output_is_capped() {
        let runner = ProcessRunner::new().with_max_output_bytes(4);
        let out = runner
            .run(&CommandSpec::new("echo").arg("abcdefgh"))
            .await
            .unwrap();
        assert!(out.stdout.starts_with("abcd"));
        assert!(out.stdout.contains("[truncated: 9 bytes total]"));
    }

    #[tokio::test]
    async fn recording_runner_records() {
        let runner = RecordingRunner::new();
        let spec = CommandSpec::new("hugo").args(["--source", "site"]);
        let out = runner.run(&spec).await.unwrap();
        assert_eq!(out.code, 0);
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.last().unwrap().args, ["--source", "site"]);
    }

    #[test]
    fn display_name_hides_directories() {
        assert_eq!(CommandSpec::new("/usr/local/bin/zola").display_name(), "zola");
        assert_eq!(CommandSpec::new("hugo").display_name(), "hugo");
    }
}
