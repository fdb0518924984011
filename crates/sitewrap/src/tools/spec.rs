//! Declarative tool specifications.
//!
//! A [`ToolSpec`] is the data form of a tool: name, description, declared
//! parameters, and an argument template. It deserializes from configuration
//! and builds with a fluent API in code. [`ToolSpec::build`] checks the whole
//! declaration and compiles it into a [`CommandTool`]; a malformed spec is a
//! [`RegistrationError`], never a panic.

use crate::error::RegistrationError;
use crate::tools::core::CommandTool;
use crate::tools::template::{ArgPart, ArgTemplate};
use crate::validate::{LanguageRiskProfile, ParamKind, ParamSpec, input_schema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    #[serde(default)]
    pub args: Vec<ArgPart>,
    /// Run this program instead of the adapter's binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    /// Path parameter whose value becomes the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir_param: Option<String>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            args: Vec::new(),
            program: None,
            workdir_param: None,
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn arg(mut self, part: ArgPart) -> Self {
        self.args.push(part);
        self
    }

    /// Append a literal argument for each item.
    pub fn lits<I, S>(mut self, lits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(lits.into_iter().map(|s| ArgPart::Lit(s.into())));
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn workdir_param(mut self, param: impl Into<String>) -> Self {
        self.workdir_param = Some(param.into());
        self
    }

    /// [`build_for`](Self::build_for) under the shell profile.
    pub fn build(self) -> Result<CommandTool, RegistrationError> {
        self.build_for(LanguageRiskProfile::Shell)
    }

    /// Check the declaration and compile it into a runnable tool. Parameter
    /// defaults must pass their validator under `profile`.
    pub fn build_for(self, profile: LanguageRiskProfile) -> Result<CommandTool, RegistrationError> {
        let invalid = |reason: &str| RegistrationError::InvalidTool {
            tool: self.name.clone(),
            reason: reason.to_string(),
        };

        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if self.name.is_empty() || !self.name.chars().all(valid_char) {
            return Err(invalid("name may only contain letters, digits, '_', '-'"));
        }
        if self.program.as_deref().is_some_and(str::is_empty) {
            return Err(invalid("program override must not be empty"));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(RegistrationError::DuplicateParameter {
                    tool: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            if let Some(default) = &param.default
                && param.validate(Some(default), profile).is_err()
            {
                return Err(invalid(&format!(
                    "default for '{}' does not pass its own validator",
                    param.name
                )));
            }
        }

        if let Some(wd) = &self.workdir_param {
            match self.params.iter().find(|p| &p.name == wd) {
                Some(p) if p.kind == ParamKind::Path => {}
                Some(_) => return Err(invalid("working-directory parameter must be a path")),
                None => {
                    return Err(RegistrationError::UndeclaredParameter {
                        tool: self.name.clone(),
                        param: wd.clone(),
                    });
                }
            }
        }

        let template = ArgTemplate::compile(&self.name, &self.args, &self.params)?;
        let schema = input_schema(&self.params);
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| invalid(&format!("input schema does not compile: {e}")))?;

        Ok(CommandTool {
            name: self.name,
            description: self.description,
            params: self.params,
            template,
            program: self.program,
            workdir_param: self.workdir_param,
            schema,
            validator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::core::Tool;

    #[test]
    fn builds_definition_with_schema() {
        let tool = ToolSpec::new("serve", "Serve the site locally")
            .param(ParamSpec::port("port").describe("Port to listen on"))
            .param(ParamSpec::path("source").required())
            .lits(["server"])
            .arg(ArgPart::opt("--port", "port"))
            .build()
            .unwrap();
        let def = tool.definition();
        assert_eq!(def.name, "serve");
        assert_eq!(def.description, "Serve the site locally");
        assert_eq!(def.input_schema["required"], serde_json::json!(["source"]));
        assert_eq!(
            def.input_schema["properties"]["port"]["description"],
            "Port to listen on"
        );
    }

    #[test]
    fn duplicate_parameters_rejected() {
        let err = ToolSpec::new("build", "Build")
            .param(ParamSpec::path("source"))
            .param(ParamSpec::path("source"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateParameter { .. }));
    }

    #[test]
    fn bad_names_and_defaults_rejected() {
        assert!(ToolSpec::new("build site", "x").build().is_err());
        assert!(ToolSpec::new("", "x").build().is_err());
        assert!(
            ToolSpec::new("serve", "x")
                .param(ParamSpec::port("port").default_value(70000))
                .build()
                .is_err()
        );
    }

    #[test]
    fn workdir_param_must_be_declared_path() {
        assert!(matches!(
            ToolSpec::new("build", "x").workdir_param("site").build(),
            Err(RegistrationError::UndeclaredParameter { .. })
        ));
        assert!(
            ToolSpec::new("build", "x")
                .param(ParamSpec::port("site"))
                .workdir_param("site")
                .build()
                .is_err()
        );
    }

    #[test]
    fn deserializes_from_toml_like_value() {
        let spec: ToolSpec = serde_json::from_value(serde_json::json!({
            "name": "build",
            "description": "Build",
            "params": [{"name": "output", "kind": "path"}],
            "args": [{"lit": "build"}, {"opt": {"flag": "-o", "param": "output"}}]
        }))
        .unwrap();
        assert_eq!(
            spec,
            ToolSpec::new("build", "Build")
                .param(ParamSpec::path("output"))
                .lits(["build"])
                .arg(ArgPart::opt("-o", "output"))
        );
        assert!(spec.build().is_ok());
    }
}
