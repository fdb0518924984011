//! Adapters: one wrapped generator behind a uniform tool interface.
//!
//! An [`AdapterSpec`] is pure data (identity, binary, risk profile, probe,
//! tool specs). Building it against a [`FrameworkConfig`] and a
//! [`CommandRunner`] yields an [`Adapter`], which owns its tools and its
//! [`Lifecycle`] and nothing else. [`AdapterSet`] is the collection exported
//! to the orchestrating hub.
//!
//! A call runs in a fixed order: look up the tool, validate and render
//! (rejections stop here, before any process), pass the lifecycle gate
//! (re-probing when disconnected, refusing when the breaker is open), then
//! run.

use crate::config::FrameworkConfig;
use crate::error::{RegistrationError, ToolError};
use crate::lifecycle::{Lifecycle, LifecycleState, LifecycleStatus, ProbeSpec};
use crate::result::{ProcessOutput, ToolResult};
use crate::retry::with_retry;
use crate::runner::{CommandRunner, CommandSpec};
use crate::tools::{ToolContext, ToolDef, ToolSet, ToolSpec};
use crate::validate::LanguageRiskProfile;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

// ── AdapterSpec ────────────────────────────────────────────────────

/// Declarative description of an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdapterSpec {
    pub name: String,
    /// Implementation-language label of the wrapped generator.
    pub language: String,
    pub description: String,
    /// Executable name or path.
    pub binary: String,
    pub profile: LanguageRiskProfile,
    #[serde(default)]
    pub probe: ProbeSpec,
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

impl AdapterSpec {
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        binary: impl Into<String>,
        profile: LanguageRiskProfile,
    ) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            description: String::new(),
            binary: binary.into(),
            profile,
            probe: ProbeSpec::default(),
            tools: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn probe(mut self, probe: ProbeSpec) -> Self {
        self.probe = probe;
        self
    }

    pub fn tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    /// Validate the declaration and build a live adapter.
    pub fn build(
        self,
        config: &FrameworkConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Adapter, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidAdapter {
            adapter: self.name.clone(),
            reason: reason.to_string(),
        };
        let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';
        if self.name.is_empty() || !self.name.chars().all(valid_char) {
            return Err(invalid("name may only contain lowercase letters, digits, '-'"));
        }
        if self.binary.trim().is_empty() {
            return Err(invalid("binary must not be empty"));
        }
        if self.tools.is_empty() {
            return Err(invalid("at least one tool is required"));
        }

        let mut tools = ToolSet::new();
        for spec in self.tools {
            tools.register(spec.build_for(self.profile)?)?;
        }

        Ok(Adapter {
            lifecycle: Lifecycle::new(&self.name, config.breaker_threshold),
            name: self.name,
            language: self.language,
            description: self.description,
            binary: self.binary,
            profile: self.profile,
            probe: self.probe,
            tools,
            runner,
            config: config.clone(),
        })
    }
}

// ── Adapter ────────────────────────────────────────────────────────

/// Exported surface of an adapter.
#[derive(Debug, Clone, Serialize)]
pub struct AdapterInfo {
    pub name: String,
    pub language: String,
    pub description: String,
    pub binary: String,
    pub profile: LanguageRiskProfile,
    pub state: LifecycleState,
    pub tools: Vec<ToolDef>,
}

/// A live adapter wrapping one generator.
pub struct Adapter {
    name: String,
    language: String,
    description: String,
    binary: String,
    profile: LanguageRiskProfile,
    probe: ProbeSpec,
    tools: ToolSet,
    lifecycle: Lifecycle,
    runner: Arc<dyn CommandRunner>,
    config: FrameworkConfig,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("binary", &self.binary)
            .field("profile", &self.profile)
            .field("tools", &self.tools)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

impl Adapter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn profile(&self) -> LanguageRiskProfile {
        self.profile
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    /// Tool definitions in declaration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.definitions()
    }

    pub fn info(&self) -> AdapterInfo {
        AdapterInfo {
            name: self.name.clone(),
            language: self.language.clone(),
            description: self.description.clone(),
            binary: self.binary.clone(),
            profile: self.profile,
            state: self.lifecycle.state(),
            tools: self.definitions(),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Probe the binary. Returns whether the adapter is now connected.
    pub async fn connect(&self) -> bool {
        self.try_connect().await.is_ok()
    }

    /// Like [`connect`](Self::connect), keeping the failure.
    pub async fn try_connect(&self) -> Result<(), ToolError> {
        self.lifecycle.connect(self.probe_binary()).await
    }

    pub fn disconnect(&self) {
        self.lifecycle.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle.is_connected()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn status(&self) -> LifecycleStatus {
        self.lifecycle.status()
    }

    async fn probe_binary(&self) -> Result<(), ToolError> {
        let program = self.probe.program.as_deref().unwrap_or(&self.binary);
        let spec = CommandSpec::new(program)
            .args(self.probe.args.iter().cloned())
            .timeout(self.config.probe_timeout);
        debug!("[{}] probing {}", self.name, spec.display_name());
        self.runner
            .run(&spec)
            .await?
            .check(&self.probe.lenient_exit_codes)
            .map(|_| ())
    }

    async fn ensure_connected(&self) -> Result<(), ToolError> {
        if self.lifecycle.is_connected() {
            return Ok(());
        }
        let status = self.lifecycle.status();
        if status.breaker_open {
            return Err(ToolError::Fatal {
                adapter: self.name.clone(),
                failures: status.consecutive_failures,
            });
        }
        debug!("[{}] not connected, probing before call", self.name);
        self.try_connect().await
    }

    // ── Calls ──────────────────────────────────────────────────────

    fn context(&self) -> ToolContext<'_> {
        ToolContext {
            program: &self.binary,
            profile: self.profile,
            timeout: self.config.timeout,
            workdir: self.config.workdir.as_deref(),
        }
    }

    /// Validate and render a call without running it.
    pub fn prepare(&self, tool: &str, params: &Value) -> Result<CommandSpec, ToolError> {
        self.tools.prepare(tool, params, &self.context())
    }

    /// Invoke a tool, keeping the typed failure.
    pub async fn try_call(&self, tool: &str, params: &Value) -> Result<ProcessOutput, ToolError> {
        let spec = self.prepare(tool, params)?;
        self.ensure_connected().await?;
        ToolSet::run_prepared(tool, &spec, self.runner.as_ref()).await
    }

    /// Invoke a tool. Every outcome, including rejection, is a
    /// [`ToolResult`].
    pub async fn call(&self, tool: &str, params: &Value) -> ToolResult {
        self.try_call(tool, params).await.into()
    }

    /// Invoke a tool, retrying execution and system failures with the
    /// configured backoff.
    pub async fn call_with_retry(&self, tool: &str, params: &Value) -> ToolResult {
        let label = format!("{}.{tool}", self.name);
        with_retry(&self.config.retry, &label, || self.try_call(tool, params))
            .await
            .into()
    }
}

// ── AdapterSet ─────────────────────────────────────────────────────

/// The adapters exported to the hub, in registration order.
#[derive(Debug, Default)]
pub struct AdapterSet {
    adapters: Vec<Adapter>,
    index: HashMap<String, usize>,
}

impl AdapterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, adapter: Adapter) -> Result<(), RegistrationError> {
        if self.index.contains_key(adapter.name()) {
            return Err(RegistrationError::DuplicateAdapter(adapter.name().to_string()));
        }
        self.index.insert(adapter.name().to_string(), self.adapters.len());
        self.adapters.push(adapter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Adapter> {
        self.index.get(name).map(|&i| &self.adapters[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Adapter> {
        self.adapters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(Adapter::name).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn infos(&self) -> Vec<AdapterInfo> {
        self.adapters.iter().map(Adapter::info).collect()
    }

    /// Probe every adapter concurrently. Returns `(name, connected)` pairs
    /// in registration order.
    pub async fn connect_all(&self) -> Vec<(String, bool)> {
        let outcomes = join_all(self.adapters.iter().map(|a| a.connect())).await;
        self.adapters
            .iter()
            .zip(outcomes)
            .map(|(a, ok)| (a.name().to_string(), ok))
            .collect()
    }

    pub fn disconnect_all(&self) {
        for adapter in &self.adapters {
            adapter.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;
    use crate::tools::ArgPart;
    use crate::validate::ParamSpec;
    use serde_json::json;

    fn spec() -> AdapterSpec {
        AdapterSpec::new("hugo", "Go", "hugo", LanguageRiskProfile::Shell)
            .describe("Hugo static site generator")
            .probe(ProbeSpec::args(["version"]))
            .tool(
                ToolSpec::new("build", "Build the site")
                    .param(ParamSpec::path("source"))
                    .arg(ArgPart::opt("--source", "source")),
            )
    }

    fn adapter(runner: Arc<RecordingRunner>) -> Adapter {
        spec().build(&FrameworkConfig::default(), runner).unwrap()
    }

    #[tokio::test]
    async fn connect_probes_binary() {
        let runner = Arc::new(RecordingRunner::new());
        let hugo = adapter(runner.clone());
        assert!(hugo.connect().await);
        assert!(hugo.is_connected());
        let probe = runner.last().unwrap();
        assert_eq!(probe.program, "hugo");
        assert_eq!(probe.args, ["version"]);
        assert_eq!(probe.timeout, crate::DEFAULT_PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn failing_probe_means_error_state() {
        let runner = Arc::new(RecordingRunner::responding(ProcessOutput {
            code: 2,
            ..Default::default()
        }));
        let hugo = adapter(runner);
        assert!(!hugo.connect().await);
        assert_eq!(hugo.state(), LifecycleState::Error);
    }

    #[tokio::test]
    async fn call_without_connect_reprobes() {
        let runner = Arc::new(RecordingRunner::new());
        let hugo = adapter(runner.clone());
        let result = hugo.call("build", &json!({"source": "site"})).await;
        assert!(result.success);
        assert!(hugo.is_connected());
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, ["version"]);
        assert_eq!(calls[1].args, ["--source", "site"]);
    }

    #[tokio::test]
    async fn validation_runs_before_lifecycle() {
        let runner = Arc::new(RecordingRunner::new());
        let hugo = adapter(runner.clone());
        let result = hugo.call("build", &json!({"source": "../x"})).await;
        assert!(!result.success);
        assert_eq!(result.code, 1);
        assert_eq!(runner.call_count(), 0);
        assert_eq!(hugo.state(), LifecycleState::Disconnected);
    }

    #[tokio::test]
    async fn open_breaker_refuses_without_probing() {
        let runner = Arc::new(RecordingRunner::responding(ProcessOutput {
            code: 127,
            ..Default::default()
        }));
        let config = FrameworkConfig::default().with_breaker_threshold(1);
        let hugo = spec().build(&config, runner.clone()).unwrap();
        assert!(!hugo.connect().await);
        assert_eq!(runner.call_count(), 1);

        let result = hugo.call("build", &json!({})).await;
        assert!(!result.success);
        assert!(result.stderr.contains("call connect()"), "{}", result.stderr);
        assert_eq!(runner.call_count(), 1);
    }

    #[tokio::test]
    async fn retry_repeats_execution_failures() {
        let runner = Arc::new(RecordingRunner::responding(ProcessOutput {
            code: 1,
            stdout: String::new(),
            stderr: "port busy".into(),
        }));
        let config = FrameworkConfig::default().with_retry(crate::retry::RetryConfig {
            initial_delay: std::time::Duration::from_millis(1),
            ..Default::default()
        });
        let hugo = spec()
            .probe(ProbeSpec::args(["version"]).lenient(&[1]))
            .build(&config, runner.clone())
            .unwrap();
        assert!(hugo.connect().await);
        let result = hugo.call_with_retry("build", &json!({})).await;
        assert!(!result.success);
        assert_eq!(result.stderr, "port busy");
        // One probe plus three attempts.
        assert_eq!(runner.call_count(), 4);
    }

    #[test]
    fn builder_rejects_bad_declarations() {
        let runner: Arc<dyn CommandRunner> = Arc::new(RecordingRunner::new());
        let config = FrameworkConfig::default();
        let no_tools = AdapterSpec::new("zola", "Rust", "zola", LanguageRiskProfile::Shell);
        assert!(no_tools.build(&config, runner.clone()).is_err());

        let bad_name = spec();
        let bad_name = AdapterSpec {
            name: "Hugo Site".into(),
            ..bad_name
        };
        assert!(bad_name.build(&config, runner.clone()).is_err());

        let dup = spec().tool(ToolSpec::new("build", "again"));
        assert_eq!(
            dup.build(&config, runner).unwrap_err(),
            RegistrationError::DuplicateTool("build".into())
        );
    }

    #[tokio::test]
    async fn set_connects_all_and_exports() {
        let runner = Arc::new(RecordingRunner::new());
        let mut set = AdapterSet::new();
        set.insert(adapter(runner.clone())).unwrap();
        let zola = AdapterSpec::new("zola", "Rust", "zola", LanguageRiskProfile::Shell)
            .tool(ToolSpec::new("build", "Build").lits(["build"]))
            .build(&FrameworkConfig::default(), runner.clone())
            .unwrap();
        set.insert(zola).unwrap();
        assert!(set.insert(adapter(runner.clone())).is_err());

        let outcomes = set.connect_all().await;
        assert_eq!(
            outcomes,
            [("hugo".to_string(), true), ("zola".to_string(), true)]
        );
        let infos = set.infos();
        assert_eq!(infos[1].name, "zola");
        assert_eq!(infos[1].state, LifecycleState::Connected);
        let json = serde_json::to_value(&infos[0]).unwrap();
        assert_eq!(json["tools"][0]["inputSchema"]["type"], "object");

        set.disconnect_all();
        assert!(set.iter().all(|a| !a.is_connected()));
    }
}
