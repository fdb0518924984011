//! The validator set: parameter declarations and category validators.
//!
//! A tool declares its parameters as [`ParamSpec`]s. At invocation time
//! [`validate_params`] turns the caller's raw JSON object into
//! [`ValidatedParams`], running each declared parameter through the
//! validator for its [`ParamKind`] under the adapter's
//! [`LanguageRiskProfile`]. Nothing reaches an argument template without
//! passing through here first.

pub mod profile;
pub mod rules;

pub use profile::LanguageRiskProfile;
pub use rules::{
    DEFAULT_MAX_STRING_LEN, sanitize_string, validate_flag, validate_identifier, validate_path,
    validate_port, validate_url,
};

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

// ── Declarations ───────────────────────────────────────────────────

/// Semantic category of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Path,
    Port,
    Identifier,
    Url,
    String,
    Flag,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Port => "port",
            Self::Identifier => "identifier",
            Self::Url => "url",
            Self::String => "string",
            Self::Flag => "flag",
        }
    }

    /// JSON types the validator for this kind accepts.
    fn json_types(self) -> Value {
        match self {
            Self::Path => json!(["string", "number"]),
            Self::Port => json!(["integer", "string"]),
            Self::Flag => json!(["boolean", "string"]),
            Self::Identifier | Self::Url | Self::String => json!("string"),
        }
    }
}

/// Declaration of one tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    /// Permit spaces in path values.
    #[serde(default)]
    pub allow_spaces: bool,
    /// Length cap for free-form strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    /// Value used when the caller omits the parameter. Validated like
    /// caller input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: String::new(),
            allow_spaces: false,
            max_len: None,
            default: None,
        }
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Path)
    }

    pub fn port(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Port)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Identifier)
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Url)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Flag)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_spaces(mut self) -> Self {
        self.allow_spaces = true;
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.max_len = Some(max);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether a validated value is always present for this parameter.
    pub fn always_present(&self) -> bool {
        self.required || self.default.is_some()
    }

    /// Validate the raw value for this parameter.
    ///
    /// Returns `Ok(None)` when an optional parameter without a default was
    /// omitted.
    pub fn validate(
        &self,
        raw: Option<&Value>,
        profile: LanguageRiskProfile,
    ) -> Result<Option<Sanitized>, ValidationError> {
        let raw = match raw.filter(|v| !v.is_null()) {
            Some(v) => v,
            None if self.required => {
                return Err(ValidationError::new(&self.name, "is required"));
            }
            None => match &self.default {
                Some(default) => default,
                None => return Ok(None),
            },
        };
        let raw = Some(raw);
        let value = match self.kind {
            ParamKind::Path => {
                validate_path(raw, profile, self.allow_spaces).map(Sanitized::Text)
            }
            ParamKind::Port => validate_port(raw).map(Sanitized::Port),
            ParamKind::Identifier => validate_identifier(raw).map(Sanitized::Text),
            ParamKind::Url => validate_url(raw, profile).map(Sanitized::Text),
            ParamKind::String => sanitize_string(
                raw,
                profile,
                self.max_len.unwrap_or(DEFAULT_MAX_STRING_LEN),
            )
            .map(Sanitized::Text),
            ParamKind::Flag => validate_flag(raw).map(Sanitized::Flag),
        };
        value.map(Some).map_err(|e| e.named(&self.name))
    }

    fn property_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), self.kind.json_types());
        if !self.description.is_empty() {
            prop.insert("description".into(), json!(self.description));
        }
        if self.kind == ParamKind::Port {
            prop.insert("minimum".into(), json!(1));
            prop.insert("maximum".into(), json!(65535));
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        prop.insert("x-category".into(), json!(self.kind.as_str()));
        Value::Object(prop)
    }
}

/// The `inputSchema` object for a parameter list: every parameter with its
/// accepted JSON types, the required set, and no additional properties.
pub fn input_schema(params: &[ParamSpec]) -> Value {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), p.property_schema()))
        .collect();
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

// ── Validated values ───────────────────────────────────────────────

/// A value that passed its category validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanitized {
    Text(String),
    Port(u16),
    Flag(bool),
}

impl Sanitized {
    /// The value as a single command-line argument.
    pub fn as_arg(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Port(p) => p.to_string(),
            Self::Flag(b) => b.to_string(),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// Sanitized parameters of one invocation, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedParams {
    values: BTreeMap<String, Sanitized>,
}

impl ValidatedParams {
    pub fn get(&self, name: &str) -> Option<&Sanitized> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Sanitized) {
        self.values.insert(name.into(), value);
    }
}

/// Reject argument keys that name no declared parameter.
pub fn reject_unknown(params: &[ParamSpec], args: &Map<String, Value>) -> Result<(), ValidationError> {
    let unknown: Vec<&str> = args
        .keys()
        .filter(|k| !params.iter().any(|p| &p.name == *k))
        .map(String::as_str)
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "arguments",
            format!("unknown parameter(s): {}", unknown.join(", ")),
        ))
    }
}

/// Validate a caller's argument object against declared parameters.
///
/// `null` values count as omitted. Undeclared keys are rejected. Stops at the
/// first invalid parameter, in declaration order.
pub fn validate_params(
    params: &[ParamSpec],
    args: &Map<String, Value>,
    profile: LanguageRiskProfile,
) -> Result<ValidatedParams, ValidationError> {
    reject_unknown(params, args)?;
    let mut validated = ValidatedParams::default();
    for spec in params {
        if let Some(value) = spec.validate(args.get(&spec.name), profile)? {
            validated.insert(spec.name.clone(), value);
        }
    }
    Ok(validated)
}
