//! Hub configuration: a TOML file plus per-adapter environment overrides.
//!
//! ```toml
//! [defaults]
//! timeout_secs = 60
//! workdir = "/srv/sites"
//!
//! [retry]
//! max_attempts = 5
//! jitter = true
//!
//! [adapters.hugo]
//! binary = "/opt/hugo/bin/hugo"
//!
//! [adapters.sculpin]
//! enabled = false
//!
//! [[custom]]
//! name = "blogc"
//! language = "C"
//! description = "blogc compiler"
//! binary = "blogc"
//! profile = "shell"
//!
//! [[custom.tools]]
//! name = "build"
//! description = "Compile one template"
//! params = [{ name = "template", kind = "path", required = true }]
//! args = [{ opt = { flag = "-t", param = "template" } }]
//! ```
//!
//! `SITEWRAP_<NAME>_BIN` (adapter name upper-cased, `-` as `_`) replaces an
//! adapter's binary after the file is applied.

use crate::catalog;
use serde::Deserialize;
use sitewrap::adapter::{AdapterSet, AdapterSpec};
use sitewrap::config::FrameworkConfig;
use sitewrap::error::RegistrationError;
use sitewrap::retry::RetryConfig;
use sitewrap::runner::CommandRunner;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SITEWRAP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("[adapters.{0}] does not name a known adapter")]
    UnknownAdapter(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

// ── File format ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    pub defaults: Defaults,
    pub retry: RetrySection,
    /// Overrides for built-in and custom adapters, keyed by adapter name.
    pub adapters: BTreeMap<String, AdapterOverride>,
    /// Adapters defined entirely in the config file.
    pub custom: Vec<AdapterSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Defaults {
    pub timeout_secs: Option<u64>,
    pub probe_timeout_secs: Option<u64>,
    pub workdir: Option<PathBuf>,
    pub breaker_threshold: Option<u32>,
    pub max_output_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySection {
    pub max_attempts: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
    /// Scale backoff delays by the retry jitter factors.
    pub jitter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterOverride {
    pub binary: Option<String>,
    pub enabled: bool,
}

impl Default for AdapterOverride {
    fn default() -> Self {
        Self {
            binary: None,
            enabled: true,
        }
    }
}

/// Name of the environment variable that overrides an adapter's binary.
pub fn binary_env_var(adapter: &str) -> String {
    format!(
        "SITEWRAP_{}_BIN",
        adapter.to_ascii_uppercase().replace('-', "_")
    )
}

impl HubConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Load `explicit`, else the file named by `SITEWRAP_CONFIG`, else use
    /// defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
                _ => Ok(Self::default()),
            },
        }
    }

    /// The framework settings this file describes, over the defaults.
    pub fn framework_config(&self) -> Result<FrameworkConfig, ConfigError> {
        let mut config = FrameworkConfig::default();
        let d = &self.defaults;

        if let Some(secs) = d.timeout_secs {
            config = config.with_timeout(positive_secs("timeout_secs", secs)?);
        }
        if let Some(secs) = d.probe_timeout_secs {
            config = config.with_probe_timeout(positive_secs("probe_timeout_secs", secs)?);
        }
        if let Some(threshold) = d.breaker_threshold {
            if threshold == 0 {
                return Err(ConfigError::Invalid("breaker_threshold must be at least 1".into()));
            }
            config = config.with_breaker_threshold(threshold);
        }
        if let Some(max) = d.max_output_bytes {
            config = config.with_max_output_bytes(max);
        }
        if let Some(dir) = &d.workdir {
            config = config.with_workdir(dir.clone());
        }

        let r = &self.retry;
        let mut retry = RetryConfig::default();
        if let Some(attempts) = r.max_attempts {
            retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = r.initial_delay_ms {
            retry.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = r.max_delay_ms {
            retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = r.multiplier {
            if !(multiplier.is_finite() && multiplier >= 1.0) {
                return Err(ConfigError::Invalid("retry.multiplier must be at least 1.0".into()));
            }
            retry.multiplier = multiplier;
        }
        if let Some(jitter) = r.jitter {
            retry.jitter = jitter;
        }
        Ok(config.with_retry(retry))
    }

    /// Built-in plus custom specs, with overrides applied and disabled
    /// adapters removed. Binary overrides come from the environment.
    pub fn resolve_specs(&self) -> Result<Vec<AdapterSpec>, ConfigError> {
        self.resolve_specs_with(|key| std::env::var(key).ok())
    }

    /// [`resolve_specs`](Self::resolve_specs) with an explicit environment
    /// lookup.
    pub fn resolve_specs_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<AdapterSpec>, ConfigError> {
        let mut specs = catalog::all();
        specs.extend(self.custom.iter().cloned());

        let known: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        if let Some(name) = self.adapters.keys().find(|k| !known.contains(k.as_str())) {
            return Err(ConfigError::UnknownAdapter(name.clone()));
        }

        let mut resolved = Vec::with_capacity(specs.len());
        for mut spec in specs {
            let overrides = self.adapters.get(&spec.name);
            if overrides.is_some_and(|o| !o.enabled) {
                debug!("adapter {} disabled by config", spec.name);
                continue;
            }
            if let Some(binary) = overrides.and_then(|o| o.binary.clone()) {
                spec.binary = binary;
            }
            if let Some(binary) = env(&binary_env_var(&spec.name)).filter(|b| !b.is_empty()) {
                debug!("adapter {} binary from environment", spec.name);
                spec.binary = binary;
            }
            resolved.push(spec);
        }
        Ok(resolved)
    }

    /// Build every enabled adapter against one runner.
    pub fn build_adapters(&self, runner: Arc<dyn CommandRunner>) -> Result<AdapterSet, ConfigError> {
        let config = self.framework_config()?;
        build_set(self.resolve_specs()?, &config, runner)
    }
}

/// Build specs into an [`AdapterSet`], failing on the first malformed or
/// duplicate adapter.
pub fn build_set(
    specs: Vec<AdapterSpec>,
    config: &FrameworkConfig,
    runner: Arc<dyn CommandRunner>,
) -> Result<AdapterSet, ConfigError> {
    let mut set = AdapterSet::new();
    for spec in specs {
        set.insert(spec.build(config, runner.clone())?)?;
    }
    Ok(set)
}

fn positive_secs(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be at least 1")));
    }
    Ok(Duration::from_secs(secs))
}
