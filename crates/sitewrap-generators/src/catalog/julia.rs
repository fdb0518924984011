//! Julia generators. Julia code is passed through `-e` as a single
//! argument built from placeholders, never by string concatenation.

use super::{new_site, port, source};
use sitewrap::adapter::AdapterSpec;
use sitewrap::tools::{ArgPart, ToolSpec};
use sitewrap::validate::{LanguageRiskProfile, ParamSpec};

const PROFILE: LanguageRiskProfile = LanguageRiskProfile::Shell;

pub fn adapters() -> Vec<AdapterSpec> {
    vec![franklin(), documenter()]
}

fn project() -> ParamSpec {
    ParamSpec::path("project").describe("Julia project environment to activate")
}

fn franklin() -> AdapterSpec {
    AdapterSpec::new("franklin", "Julia", "julia", PROFILE)
        .describe("Franklin.jl static site generator")
        .tool(
            ToolSpec::new("new", "Create a site from a Franklin template")
                .param(new_site())
                .param(
                    ParamSpec::identifier("template")
                        .default_value("basic")
                        .describe("Template name"),
                )
                .lits(["-e"])
                .arg(ArgPart::expr(
                    "using Franklin; newsite(\"{path}\", template=\"{template}\")",
                )),
        )
        .tool(
            ToolSpec::new("build", "Build and optimize the site")
                .param(source())
                .param(project())
                .param(ParamSpec::flag("minify").default_value(true).describe("Minify HTML and CSS"))
                .param(
                    ParamSpec::flag("prerender")
                        .default_value(true)
                        .describe("Pre-render KaTeX and highlight.js"),
                )
                .workdir_param("source")
                .arg(ArgPart::joined("--project", "project"))
                .lits(["-e"])
                .arg(ArgPart::expr(
                    "using Franklin; optimize(minify={minify}, prerender={prerender})",
                )),
        )
        .tool(
            ToolSpec::new("serve", "Serve the site with live reload")
                .param(source())
                .param(project())
                .param(port(8000))
                .workdir_param("source")
                .arg(ArgPart::joined("--project", "project"))
                .lits(["-e"])
                .arg(ArgPart::expr("using Franklin; serve(port={port}, launch=false)")),
        )
}

fn documenter() -> AdapterSpec {
    AdapterSpec::new("documenter", "Julia", "julia", PROFILE)
        .describe("Documenter.jl package documentation generator")
        .tool(
            ToolSpec::new("build", "Run the documentation make script")
                .param(source())
                .param(project().default_value("docs"))
                .param(
                    ParamSpec::path("script")
                        .default_value("docs/make.jl")
                        .describe("Make script to run"),
                )
                .workdir_param("source")
                .arg(ArgPart::joined("--project", "project"))
                .arg(ArgPart::value("script")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the documentation with LiveServer")
                .param(source())
                .param(project().default_value("docs"))
                .param(port(8000))
                .workdir_param("source")
                .arg(ArgPart::joined("--project", "project"))
                .lits(["-e"])
                .arg(ArgPart::expr(
                    "using LiveServer; servedocs(port={port}, launch_browser=false)",
                )),
        )
        .tool(
            ToolSpec::new("new", "Generate a docs/ skeleton for a package")
                .param(new_site())
                .lits(["-e"])
                .arg(ArgPart::expr(
                    "using DocumenterTools; DocumenterTools.generate(\"{path}\")",
                )),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitewrap::config::FrameworkConfig;
    use sitewrap::runner::RecordingRunner;
    use std::sync::Arc;

    #[test]
    fn snippet_is_one_argument() {
        let adapter = franklin()
            .build(&FrameworkConfig::default(), Arc::new(RecordingRunner::new()))
            .unwrap();
        let spec = adapter
            .prepare("new", &json!({"path": "mysite", "template": "sandbox"}))
            .unwrap();
        assert_eq!(spec.program, "julia");
        assert_eq!(
            spec.args,
            ["-e", "using Franklin; newsite(\"mysite\", template=\"sandbox\")"]
        );
    }

    #[test]
    fn snippet_rejects_backtick() {
        let adapter = franklin()
            .build(&FrameworkConfig::default(), Arc::new(RecordingRunner::new()))
            .unwrap();
        assert!(adapter.prepare("new", &json!({"path": "my`site"})).is_err());
    }

    #[test]
    fn flags_render_as_julia_booleans() {
        let adapter = franklin()
            .build(&FrameworkConfig::default(), Arc::new(RecordingRunner::new()))
            .unwrap();
        let spec = adapter
            .prepare("build", &json!({"minify": false, "project": "site"}))
            .unwrap();
        assert_eq!(
            spec.args,
            [
                "--project=site",
                "-e",
                "using Franklin; optimize(minify=false, prerender=true)"
            ]
        );
    }
}
