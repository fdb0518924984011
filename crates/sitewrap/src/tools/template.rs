//! Argument templates: from validated parameters to an argument vector.
//!
//! A template is a list of [`ArgPart`]s. Each part renders to zero, one, or
//! two arguments. A target-language snippet ([`ArgPart::Expr`]) always
//! renders to exactly one argument, with `{param}` placeholders replaced by
//! already-validated values, so it can be handed to `-e`/`--eval` flags
//! without any string ever being re-parsed by a shell.
//!
//! Templates are checked against the tool's parameters when the tool is
//! built; rendering cannot reference an undeclared parameter.

use crate::error::{RegistrationError, ValidationError};
use crate::validate::{ParamKind, ParamSpec, ValidatedParams};
use serde::{Deserialize, Serialize};

/// One piece of an argument template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgPart {
    /// A fixed argument.
    Lit(String),
    /// The parameter's value as its own argument, when present.
    Value(String),
    /// `flag value` as two arguments, when the parameter is present.
    Opt { flag: String, param: String },
    /// `flag=value` as one argument, when the parameter is present.
    Joined { flag: String, param: String },
    /// `flag` alone, when the boolean parameter is true.
    Switch { flag: String, param: String },
    /// A source snippet with `{param}` placeholders, as one argument.
    /// `{{` and `}}` produce literal braces.
    Expr(String),
}

impl ArgPart {
    pub fn lit(s: impl Into<String>) -> Self {
        Self::Lit(s.into())
    }

    pub fn value(param: impl Into<String>) -> Self {
        Self::Value(param.into())
    }

    pub fn opt(flag: impl Into<String>, param: impl Into<String>) -> Self {
        Self::Opt {
            flag: flag.into(),
            param: param.into(),
        }
    }

    pub fn joined(flag: impl Into<String>, param: impl Into<String>) -> Self {
        Self::Joined {
            flag: flag.into(),
            param: param.into(),
        }
    }

    pub fn switch(flag: impl Into<String>, param: impl Into<String>) -> Self {
        Self::Switch {
            flag: flag.into(),
            param: param.into(),
        }
    }

    pub fn expr(src: impl Into<String>) -> Self {
        Self::Expr(src.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Param(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Compiled {
    Lit(String),
    Value(String),
    Opt { flag: String, param: String },
    Joined { flag: String, param: String },
    Switch { flag: String, param: String },
    Expr(Vec<Segment>),
}

/// A template checked against a tool's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTemplate {
    parts: Vec<Compiled>,
}

impl ArgTemplate {
    /// Check `parts` against `params` and compile placeholder snippets.
    ///
    /// Fails when a part names an undeclared parameter, a switch names a
    /// non-flag parameter, a snippet is malformed, or a snippet references a
    /// parameter that may be absent at render time.
    pub fn compile(
        tool: &str,
        parts: &[ArgPart],
        params: &[ParamSpec],
    ) -> Result<Self, RegistrationError> {
        let lookup = |param: &str| -> Result<&ParamSpec, RegistrationError> {
            params
                .iter()
                .find(|p| p.name == param)
                .ok_or_else(|| RegistrationError::UndeclaredParameter {
                    tool: tool.to_string(),
                    param: param.to_string(),
                })
        };
        let invalid = |reason: String| RegistrationError::InvalidTool {
            tool: tool.to_string(),
            reason,
        };

        let mut compiled = Vec::with_capacity(parts.len());
        for part in parts {
            let c = match part {
                ArgPart::Lit(s) => Compiled::Lit(s.clone()),
                ArgPart::Value(p) => {
                    lookup(p)?;
                    Compiled::Value(p.clone())
                }
                ArgPart::Opt { flag, param } => {
                    lookup(param)?;
                    Compiled::Opt {
                        flag: flag.clone(),
                        param: param.clone(),
                    }
                }
                ArgPart::Joined { flag, param } => {
                    lookup(param)?;
                    Compiled::Joined {
                        flag: flag.clone(),
                        param: param.clone(),
                    }
                }
                ArgPart::Switch { flag, param } => {
                    if lookup(param)?.kind != ParamKind::Flag {
                        return Err(invalid(format!(
                            "switch '{flag}' needs a flag parameter, '{param}' is not one"
                        )));
                    }
                    Compiled::Switch {
                        flag: flag.clone(),
                        param: param.clone(),
                    }
                }
                ArgPart::Expr(src) => {
                    let segments = parse_snippet(src).map_err(&invalid)?;
                    for segment in &segments {
                        if let Segment::Param(name) = segment
                            && !lookup(name)?.always_present()
                        {
                            return Err(invalid(format!(
                                "snippet placeholder '{{{name}}}' must be required or have a default"
                            )));
                        }
                    }
                    Compiled::Expr(segments)
                }
            };
            compiled.push(c);
        }
        Ok(Self { parts: compiled })
    }

    /// Names of all parameters the template reads.
    pub fn referenced_params(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for part in &self.parts {
            match part {
                Compiled::Lit(_) => {}
                Compiled::Value(p)
                | Compiled::Opt { param: p, .. }
                | Compiled::Joined { param: p, .. }
                | Compiled::Switch { param: p, .. } => names.push(p.as_str()),
                Compiled::Expr(segments) => {
                    names.extend(segments.iter().filter_map(|s| match s {
                        Segment::Param(p) => Some(p.as_str()),
                        Segment::Text(_) => None,
                    }))
                }
            }
        }
        names
    }

    /// Render the argument vector.
    pub fn render(&self, params: &ValidatedParams) -> Result<Vec<String>, ValidationError> {
        let mut args = Vec::new();
        for part in &self.parts {
            match part {
                Compiled::Lit(s) => args.push(s.clone()),
                Compiled::Value(p) => {
                    if let Some(v) = params.get(p) {
                        args.push(v.as_arg());
                    }
                }
                Compiled::Opt { flag, param } => {
                    if let Some(v) = params.get(param) {
                        args.push(flag.clone());
                        args.push(v.as_arg());
                    }
                }
                Compiled::Joined { flag, param } => {
                    if let Some(v) = params.get(param) {
                        args.push(format!("{flag}={}", v.as_arg()));
                    }
                }
                Compiled::Switch { flag, param } => {
                    if params.get(param).and_then(|v| v.as_flag()) == Some(true) {
                        args.push(flag.clone());
                    }
                }
                Compiled::Expr(segments) => {
                    let mut snippet = String::new();
                    for segment in segments {
                        match segment {
                            Segment::Text(t) => snippet.push_str(t),
                            Segment::Param(p) => {
                                let v = params
                                    .get(p)
                                    .ok_or_else(|| ValidationError::new(p, "is required"))?;
                                snippet.push_str(&v.as_arg());
                            }
                        }
                    }
                    args.push(snippet);
                }
            }
        }
        Ok(args)
    }
}

fn parse_snippet(src: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) if ch.is_ascii_alphanumeric() || ch == '_' => name.push(ch),
                        Some(_) | None => {
                            return Err("snippet has an unterminated or malformed placeholder"
                                .to_string());
                        }
                    }
                }
                if name.is_empty() {
                    return Err("snippet has an empty placeholder".to_string());
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Param(name));
            }
            '}' => return Err("snippet has an unmatched '}'".to_string()),
            other => text.push(other),
        }
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Sanitized;

    fn params() -> Vec<ParamSpec> {
        vec![
            ParamSpec::path("source").default_value("."),
            ParamSpec::port("port"),
            ParamSpec::flag("drafts"),
            ParamSpec::identifier("name").required(),
        ]
    }

    fn values(pairs: &[(&str, Sanitized)]) -> ValidatedParams {
        let mut v = ValidatedParams::default();
        for (k, s) in pairs {
            v.insert(*k, s.clone());
        }
        v
    }

    #[test]
    fn optional_parts_only_render_when_present() {
        let template = ArgTemplate::compile(
            "serve",
            &[
                ArgPart::lit("server"),
                ArgPart::opt("--source", "source"),
                ArgPart::opt("--port", "port"),
                ArgPart::switch("--buildDrafts", "drafts"),
            ],
            &params(),
        )
        .unwrap();

        let args = template
            .render(&values(&[("source", Sanitized::Text("site".into()))]))
            .unwrap();
        assert_eq!(args, ["server", "--source", "site"]);

        let args = template
            .render(&values(&[
                ("source", Sanitized::Text("site".into())),
                ("port", Sanitized::Port(1313)),
                ("drafts", Sanitized::Flag(true)),
            ]))
            .unwrap();
        assert_eq!(
            args,
            ["server", "--source", "site", "--port", "1313", "--buildDrafts"]
        );
    }

    #[test]
    fn joined_and_value_forms() {
        let template = ArgTemplate::compile(
            "serve",
            &[ArgPart::joined("--port", "port"), ArgPart::value("source")],
            &params(),
        )
        .unwrap();
        let args = template
            .render(&values(&[
                ("port", Sanitized::Port(8000)),
                ("source", Sanitized::Text("docs".into())),
            ]))
            .unwrap();
        assert_eq!(args, ["--port=8000", "docs"]);
    }

    #[test]
    fn snippet_is_a_single_argument() {
        let template = ArgTemplate::compile(
            "new",
            &[
                ArgPart::lit("-e"),
                ArgPart::expr("using Franklin; newsite(\"{name}\"; template=\"basic\")"),
            ],
            &params(),
        )
        .unwrap();
        let args = template
            .render(&values(&[("name", Sanitized::Text("Blog".into()))]))
            .unwrap();
        assert_eq!(
            args,
            ["-e", "using Franklin; newsite(\"Blog\"; template=\"basic\")"]
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        let template =
            ArgTemplate::compile("x", &[ArgPart::expr("Dict{{}}({name})")], &params()).unwrap();
        let args = template
            .render(&values(&[("name", Sanitized::Text("a".into()))]))
            .unwrap();
        assert_eq!(args, ["Dict{}(a)"]);
    }

    #[test]
    fn undeclared_parameters_fail_compilation() {
        let err = ArgTemplate::compile("build", &[ArgPart::value("output")], &params())
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::UndeclaredParameter {
                tool: "build".into(),
                param: "output".into()
            }
        );
        assert!(ArgTemplate::compile("build", &[ArgPart::expr("({missing})")], &params()).is_err());
    }

    #[test]
    fn malformed_templates_fail_compilation() {
        assert!(ArgTemplate::compile("x", &[ArgPart::expr("({name)")], &params()).is_err());
        assert!(ArgTemplate::compile("x", &[ArgPart::expr("a}b")], &params()).is_err());
        assert!(ArgTemplate::compile("x", &[ArgPart::expr("{}")], &params()).is_err());
        assert!(ArgTemplate::compile("x", &[ArgPart::switch("--p", "port")], &params()).is_err());
        // Optional without default may be absent inside a snippet.
        assert!(ArgTemplate::compile("x", &[ArgPart::expr("serve({port})")], &params()).is_err());
    }

    #[test]
    fn referenced_params_lists_placeholders() {
        let template = ArgTemplate::compile(
            "x",
            &[ArgPart::opt("--port", "port"), ArgPart::expr("f({name}, {source})")],
            &params(),
        )
        .unwrap();
        assert_eq!(template.referenced_params(), ["port", "name", "source"]);
    }

    #[test]
    fn parts_deserialize_from_toml_shape() {
        let parts: Vec<ArgPart> = serde_json::from_value(serde_json::json!([
            {"lit": "build"},
            {"opt": {"flag": "--output", "param": "output"}},
            {"expr": "(build {name})"}
        ]))
        .unwrap();
        assert_eq!(parts[0], ArgPart::lit("build"));
        assert_eq!(parts[1], ArgPart::opt("--output", "output"));
        assert_eq!(parts[2], ArgPart::expr("(build {name})"));
    }
}
