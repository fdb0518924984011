//! Command-line front end for the generator adapters.
//!
//! Results and adapter descriptions go to stdout as JSON; logs go to stderr.
//!
//! # Examples
//!
//! ```sh
//! # What is available, and what does hugo accept?
//! sitewrap list
//! sitewrap describe hugo
//!
//! # Probe binaries
//! sitewrap connect --all
//!
//! # Run a tool; the exit status is the result code
//! sitewrap run hugo build --param source=site --param drafts=true
//! sitewrap run franklin new --params '{"path": "blog"}' --dry-run
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use serde_json::{Map, Value, json};
use sitewrap::adapter::{Adapter, AdapterSet, AdapterSpec};
use sitewrap::config::FrameworkConfig;
use sitewrap::runner::CommandRunner;
use sitewrap::ToolResult;
use sitewrap_generators::HubConfig;
use sitewrap_generators::config::build_set;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run static site generators through validated adapters.
#[derive(Parser)]
#[command(name = "sitewrap", version)]
struct Cli {
    /// Config file. Defaults to $SITEWRAP_CONFIG when set.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More logging on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the enabled adapters.
    List {
        /// Print the full adapter surface as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print one adapter's name, language, tools and input schemas.
    Describe { adapter: String },
    /// Probe adapter binaries and print each lifecycle status.
    Connect {
        adapters: Vec<String>,
        /// Probe every enabled adapter.
        #[arg(long, conflicts_with = "adapters")]
        all: bool,
    },
    /// Invoke one tool and print its result.
    Run {
        adapter: String,
        tool: String,
        /// Parameters as a JSON object.
        #[arg(long)]
        params: Option<String>,
        /// One parameter. VALUE is read as JSON when it parses, else as text.
        #[arg(long = "param", value_name = "KEY=VALUE")]
        param: Vec<String>,
        /// Retry failed executions with backoff.
        #[arg(long)]
        retry: bool,
        /// Validate and print the command without running it.
        #[arg(long)]
        dry_run: bool,
        /// Base directory for the tool's working directory.
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
    /// Print the JSON schema of a tool result.
    Schema,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Schema => print_json(&sitewrap::json_schema_for::<ToolResult>()),
        Command::List { json } => {
            let (config, specs) = load(cli.config.as_deref());
            let set = build(specs, &config);
            if json {
                print_json(&set.infos());
            } else {
                for adapter in set.iter() {
                    println!(
                        "{:<12} {:<13} {:<13} {}",
                        adapter.name(),
                        adapter.language(),
                        adapter.binary(),
                        adapter.tools().names().join(", ")
                    );
                }
            }
        }
        Command::Describe { adapter } => {
            let (config, specs) = load(cli.config.as_deref());
            let set = build(specs, &config);
            print_json(&lookup(&set, &adapter).info());
        }
        Command::Connect { adapters, all } => {
            let (config, mut specs) = load(cli.config.as_deref());
            if !all {
                if adapters.is_empty() {
                    fail(&"name at least one adapter, or pass --all");
                }
                if let Some(missing) = adapters.iter().find(|n| !specs.iter().any(|s| &s.name == *n)) {
                    fail(&format!("unknown adapter '{missing}'"));
                }
                specs.retain(|s| adapters.contains(&s.name));
            }
            let set = build(specs, &config);
            let outcomes = set.connect_all().await;
            let report: Vec<Value> = set
                .iter()
                .zip(&outcomes)
                .map(|(adapter, (_, connected))| {
                    json!({
                        "name": adapter.name(),
                        "connected": connected,
                        "status": adapter.status(),
                    })
                })
                .collect();
            print_json(&report);
            if outcomes.iter().any(|(_, ok)| !ok) {
                std::process::exit(1);
            }
        }
        Command::Run {
            adapter,
            tool,
            params,
            param,
            retry,
            dry_run,
            workdir,
        } => {
            let (mut config, specs) = load(cli.config.as_deref());
            if let Some(dir) = workdir {
                config = config.with_workdir(dir);
            }
            let params = parse_params(params.as_deref(), &param).unwrap_or_else(|e| fail(&e));
            let set = build(specs, &config);
            let adapter = lookup(&set, &adapter);

            if dry_run {
                match adapter.prepare(&tool, &params) {
                    Ok(spec) => print_json(&json!({
                        "program": spec.program,
                        "args": spec.args,
                        "cwd": spec.cwd,
                        "timeout_secs": spec.timeout.as_secs(),
                    })),
                    Err(e) => exit_with(ToolResult::from(e)),
                }
                return;
            }

            let result = if retry {
                adapter.call_with_retry(&tool, &params).await
            } else {
                adapter.call(&tool, &params).await
            };
            exit_with(result);
        }
    }
}

/// Framework settings and resolved adapter specs from the config file.
fn load(path: Option<&Path>) -> (FrameworkConfig, Vec<AdapterSpec>) {
    let hub = HubConfig::discover(path).unwrap_or_else(|e| fail(&e));
    let config = hub.framework_config().unwrap_or_else(|e| fail(&e));
    let specs = hub.resolve_specs().unwrap_or_else(|e| fail(&e));
    (config, specs)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build(specs: Vec<AdapterSpec>, config: &FrameworkConfig) -> AdapterSet {
    let runner: Arc<dyn CommandRunner> = config.build_runner();
    build_set(specs, config, runner).unwrap_or_else(|e| fail(&e))
}

fn lookup<'a>(set: &'a AdapterSet, name: &str) -> &'a Adapter {
    set.get(name).unwrap_or_else(|| {
        fail(&format!(
            "unknown adapter '{name}' (available: {})",
            set.names().join(", ")
        ))
    })
}

/// Merge `--params` JSON with `--param key=value` pairs; pairs win.
fn parse_params(json_text: Option<&str>, pairs: &[String]) -> Result<Value, String> {
    let mut object = match json_text {
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err("--params must be a JSON object".into()),
            Err(e) => return Err(format!("--params is not valid JSON: {e}")),
        },
        None => Map::new(),
    };
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(format!("--param expects KEY=VALUE, got '{pair}'"));
        };
        let value = serde_json::from_str::<Value>(raw)
            .ok()
            .filter(|v| !v.is_object() && !v.is_array())
            .unwrap_or_else(|| Value::String(raw.to_string()));
        object.insert(key.trim().to_string(), value);
    }
    Ok(Value::Object(object))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => fail(&format!("failed to serialize output: {e}")),
    }
}

fn exit_with(result: ToolResult) -> ! {
    let code = result.code;
    print_json(&result);
    std::process::exit(code);
}

fn fail(message: &dyn std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}
