//! Tool abstraction for adapters.
//!
//! The [`Tool`] trait defines what every adapter operation provides: a
//! definition (name, description, input schema) and a `prepare` step that
//! validates raw parameters and renders the exact command to run. Execution
//! itself is shared: [`ToolSet::execute`] prepares, logs, runs through a
//! [`CommandRunner`], and times the call. Because preparation is separate
//! from running, a rejected parameter never reaches the runner.

use crate::error::{RegistrationError, ToolError, ValidationError};
use crate::result::{ProcessOutput, ToolResult};
use crate::runner::{CommandRunner, CommandSpec};
use crate::tools::template::ArgTemplate;
use crate::validate::{LanguageRiskProfile, ParamSpec, Sanitized, reject_unknown, validate_params};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Public description of a tool, as exported to the hub.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Per-invocation settings supplied by the owning adapter.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    /// Binary to run unless the tool names its own.
    pub program: &'a str,
    pub profile: LanguageRiskProfile,
    pub timeout: Duration,
    /// Working directory when the tool takes none from its parameters.
    pub workdir: Option<&'a Path>,
}

// ── Tool trait ─────────────────────────────────────────────────────

/// One named operation of an adapter.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDef;

    /// Validate `params` and render the command to run.
    fn prepare(&self, params: &Value, ctx: &ToolContext<'_>) -> Result<CommandSpec, ToolError>;

    /// The tool's name (convenience, delegates to definition).
    fn name(&self) -> String {
        self.definition().name
    }
}

// ── CommandTool ────────────────────────────────────────────────────

/// A tool defined entirely by data: declared parameters plus an argument
/// template. Built through [`ToolSpec`](crate::tools::spec::ToolSpec).
pub struct CommandTool {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) params: Vec<ParamSpec>,
    pub(crate) template: ArgTemplate,
    pub(crate) program: Option<String>,
    pub(crate) workdir_param: Option<String>,
    pub(crate) schema: Value,
    pub(crate) validator: jsonschema::Validator,
}

impl fmt::Debug for CommandTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTool")
            .field("name", &self.name)
            .field("params", &self.params.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("program", &self.program)
            .finish()
    }
}

impl CommandTool {
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Check the structural schema: JSON types and known keys. Lists every
    /// problem location without repeating values.
    fn check_schema(&self, args: &Value) -> Result<(), ValidationError> {
        let locations: Vec<String> = self
            .validator
            .iter_errors(args)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() { "/".to_string() } else { path }
            })
            .collect();
        if locations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(
                "arguments",
                format!("wrong type or shape at {}", locations.join(", ")),
            ))
        }
    }
}

impl Tool for CommandTool {
    fn definition(&self) -> ToolDef {
        ToolDef::new(&self.name, &self.description, self.schema.clone())
    }

    fn prepare(&self, params: &Value, ctx: &ToolContext<'_>) -> Result<CommandSpec, ToolError> {
        let args = normalize_arguments(params)?;
        reject_unknown(&self.params, &args)?;
        self.check_schema(&Value::Object(args.clone()))?;
        let validated = validate_params(&self.params, &args, ctx.profile)?;
        let argv = self.template.render(&validated)?;

        let program = self.program.as_deref().unwrap_or(ctx.program);
        let mut spec = CommandSpec::new(program).args(argv).timeout(ctx.timeout);
        let workdir = self
            .workdir_param
            .as_deref()
            .and_then(|p| validated.get(p))
            .and_then(|v| match v {
                Sanitized::Text(dir) => Some(PathBuf::from(dir)),
                _ => None,
            });
        match (workdir, ctx.workdir) {
            (Some(dir), Some(base)) if dir.is_relative() => spec = spec.cwd(base.join(dir)),
            (Some(dir), _) => spec = spec.cwd(dir),
            (None, Some(base)) => spec = spec.cwd(base),
            (None, None) => {}
        }
        Ok(spec)
    }
}

/// Treat `null` as an empty object and drop `null` members, which count as
/// omitted parameters.
fn normalize_arguments(params: &Value) -> Result<Map<String, Value>, ValidationError> {
    match params {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        _ => Err(ValidationError::new(
            "arguments",
            "must be a JSON object of named parameters",
        )),
    }
}

// ── ToolSet ────────────────────────────────────────────────────────

/// An ordered collection of uniquely-named tools.
///
/// # Example
///
/// ```ignore
/// let tools = ToolSet::new()
///     .with(ToolSpec::new("build", "Build the site").arg(ArgPart::lit("build")).build()?)?
///     .with_if(has_serve, serve_tool)?;
/// ```
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .finish()
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Names must be unique within the set.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistrationError> {
        let name = tool.name();
        if self.index.contains_key(&name) {
            return Err(RegistrationError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(Box::new(tool));
        Ok(())
    }

    /// Register a tool (builder pattern).
    pub fn with(mut self, tool: impl Tool + 'static) -> Result<Self, RegistrationError> {
        self.register(tool)?;
        Ok(self)
    }

    /// Conditionally register a tool (builder pattern).
    pub fn with_if(
        self,
        condition: bool,
        tool: impl Tool + 'static,
    ) -> Result<Self, RegistrationError> {
        if condition { self.with(tool) } else { Ok(self) }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDef> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up and prepare a tool call without running it.
    pub fn prepare(
        &self,
        name: &str,
        params: &Value,
        ctx: &ToolContext<'_>,
    ) -> Result<CommandSpec, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;
        tool.prepare(params, ctx)
    }

    /// Run an already-prepared command, with logging and timing.
    pub async fn run_prepared(
        name: &str,
        spec: &CommandSpec,
        runner: &dyn CommandRunner,
    ) -> Result<ProcessOutput, ToolError> {
        log_tool_call(name, &spec.args);
        let start = Instant::now();
        let outcome = runner.run(spec).await.and_then(|out| out.check(&[]));
        let elapsed = start.elapsed();
        match &outcome {
            Ok(out) => debug!(
                "Tool {name} completed in {:.0}ms ({} bytes)",
                elapsed.as_secs_f64() * 1000.0,
                out.stdout.len()
            ),
            Err(e) => debug!(
                "Tool {name} failed after {:.0}ms: {} error",
                elapsed.as_secs_f64() * 1000.0,
                e.kind().as_str()
            ),
        }
        outcome
    }

    /// Prepare and run a tool call.
    pub async fn execute(
        &self,
        name: &str,
        params: &Value,
        ctx: &ToolContext<'_>,
        runner: &dyn CommandRunner,
    ) -> ToolResult {
        match self.prepare(name, params, ctx) {
            Ok(spec) => Self::run_prepared(name, &spec, runner).await.into(),
            Err(e) => {
                debug!("Tool {name} rejected: {e}");
                e.into()
            }
        }
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Log a tool call at INFO level with a truncated preview of its arguments.
pub fn log_tool_call(name: &str, args: &[String]) {
    let joined = args.join(" ");
    let preview: String = joined.chars().take(120).collect();
    info!(
        "[tool] {name}({preview}{})",
        if joined.chars().count() > 120 { "..." } else { "" }
    );
    trace!("[tool] {name} argv: {args:?}");
}
