//! Validated command execution and adapter lifecycle for wrapping static
//! site generators.
//!
//! `sitewrap` is the shared contract every generator adapter satisfies:
//! accept loosely-typed parameters from a caller, validate them against
//! category rules for the target ecosystem, run the external binary with an
//! explicit argument vector (never a shell line), and answer with the same
//! structured [`ToolResult`] whatever happened. Each adapter also carries a
//! small connection lifecycle the orchestrator can poll and retry against.
//!
//! # Getting started
//!
//! ```ignore
//! use sitewrap::prelude::*;
//! use serde_json::json;
//!
//! let config = FrameworkConfig::default();
//! let hugo = AdapterSpec::new("hugo", "Go", "hugo", LanguageRiskProfile::Shell)
//!     .describe("Hugo static site generator")
//!     .probe(ProbeSpec::args(["version"]))
//!     .tool(
//!         ToolSpec::new("build", "Build the site")
//!             .param(ParamSpec::path("source").describe("Site root"))
//!             .arg(ArgPart::opt("--source", "source")),
//!     )
//!     .build(&config, config.build_runner())?;
//!
//! if hugo.connect().await {
//!     let result = hugo.call("build", &json!({"source": "blog"})).await;
//!     println!("{}", serde_json::to_string(&result)?);
//! }
//! ```
//!
//! # Where to find things
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`validate`] | [`ParamSpec`](validate::ParamSpec), category validators, [`LanguageRiskProfile`](validate::LanguageRiskProfile) |
//! | [`runner`] | [`CommandRunner`](runner::CommandRunner), [`ProcessRunner`](runner::ProcessRunner), timeouts |
//! | [`result`] | [`ToolResult`] wire shape and the single conversion into it |
//! | [`error`] | [`ToolError`](error::ToolError) taxonomy, [`RegistrationError`](error::RegistrationError) |
//! | [`lifecycle`] | Per-adapter state machine and probe breaker |
//! | [`retry`] | Backoff policy for execution and system failures |
//! | [`tools`] | [`Tool`](tools::Tool) trait, [`ToolSpec`](tools::ToolSpec), argument templates |
//! | [`adapter`] | [`Adapter`](adapter::Adapter), [`AdapterSet`](adapter::AdapterSet) export surface |

pub mod adapter;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod prelude;
pub mod result;
pub mod retry;
pub mod runner;
pub mod tools;
pub mod validate;

pub use result::ToolResult;

use schemars::JsonSchema;
use std::time::Duration;

/// Default time limit for a tool invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default time limit for a lifecycle probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Generate a JSON Schema for a type that derives `JsonSchema`.
///
/// ```
/// let schema = sitewrap::json_schema_for::<sitewrap::ToolResult>();
/// assert_eq!(schema["type"], "object");
/// assert!(schema["required"].as_array().unwrap().contains(&"code".into()));
/// ```
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}
