//! Generators run on an interpreter: Ruby, Python, JavaScript and PHP.

use super::{drafts, host, new_site, output, port, source};
use sitewrap::adapter::AdapterSpec;
use sitewrap::lifecycle::ProbeSpec;
use sitewrap::tools::{ArgPart, ToolSpec};
use sitewrap::validate::{LanguageRiskProfile, ParamSpec};

const PROFILE: LanguageRiskProfile = LanguageRiskProfile::Shell;

pub fn adapters() -> Vec<AdapterSpec> {
    vec![
        jekyll(),
        middleman(),
        nanoc(),
        pelican(),
        mkdocs(),
        nikola(),
        lektor(),
        sphinx(),
        eleventy(),
        hexo(),
        sculpin(),
        jigsaw(),
    ]
}

// ── Ruby ───────────────────────────────────────────────────────────

fn jekyll() -> AdapterSpec {
    AdapterSpec::new("jekyll", "Ruby", "jekyll", PROFILE)
        .describe("Jekyll blog-aware static site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output())
                .param(ParamSpec::path("baseurl").describe("Path the site is served under"))
                .param(drafts())
                .lits(["build"])
                .arg(ArgPart::opt("--source", "source"))
                .arg(ArgPart::opt("--destination", "output"))
                .arg(ArgPart::opt("--baseurl", "baseurl"))
                .arg(ArgPart::switch("--drafts", "drafts")),
        )
        .tool(
            ToolSpec::new("serve", "Build and serve the site")
                .param(source())
                .param(host())
                .param(port(4000))
                .param(drafts())
                .param(ParamSpec::flag("livereload").describe("Reload browsers on change"))
                .lits(["serve"])
                .arg(ArgPart::opt("--source", "source"))
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::switch("--drafts", "drafts"))
                .arg(ArgPart::switch("--livereload", "livereload")),
        )
        .tool(
            ToolSpec::new("new", "Create a new site")
                .param(new_site())
                .param(ParamSpec::flag("blank").describe("Create an empty scaffold"))
                .lits(["new"])
                .arg(ArgPart::value("path"))
                .arg(ArgPart::switch("--blank", "blank")),
        )
}

fn middleman() -> AdapterSpec {
    AdapterSpec::new("middleman", "Ruby", "middleman", PROFILE)
        .describe("Middleman static site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(ParamSpec::flag("clean").describe("Remove orphaned files from the build"))
                .workdir_param("source")
                .lits(["build"])
                .arg(ArgPart::switch("--clean", "clean")),
        )
        .tool(
            ToolSpec::new("serve", "Run the preview server")
                .param(source())
                .param(host())
                .param(port(4567))
                .workdir_param("source")
                .lits(["server"])
                .arg(ArgPart::opt("--bind-address", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("new", "Create a new project")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
}

fn nanoc() -> AdapterSpec {
    AdapterSpec::new("nanoc", "Ruby", "nanoc", PROFILE)
        .describe("Nanoc static site generator")
        .tool(
            ToolSpec::new("build", "Compile the site")
                .param(source())
                .workdir_param("source")
                .lits(["compile"]),
        )
        .tool(
            ToolSpec::new("serve", "Serve the compiled output")
                .param(source())
                .param(host())
                .param(port(3000))
                .workdir_param("source")
                .lits(["view"])
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("check", "Run the site checks")
                .param(source())
                .workdir_param("source")
                .lits(["check", "--deploy"]),
        )
        .tool(
            ToolSpec::new("new", "Create a new site")
                .param(new_site())
                .lits(["create-site"])
                .arg(ArgPart::value("path")),
        )
}

// ── Python ─────────────────────────────────────────────────────────

fn pelican() -> AdapterSpec {
    AdapterSpec::new("pelican", "Python", "pelican", PROFILE)
        .describe("Pelican static site generator")
        .tool(
            ToolSpec::new("build", "Generate the site from content")
                .param(ParamSpec::path("content").default_value("content").describe("Content directory"))
                .param(output())
                .param(ParamSpec::path("settings").describe("Settings file"))
                .arg(ArgPart::value("content"))
                .arg(ArgPart::opt("--output", "output"))
                .arg(ArgPart::opt("--settings", "settings")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the output directory")
                .param(source())
                .param(host())
                .param(port(8000))
                .workdir_param("source")
                .lits(["--listen"])
                .arg(ArgPart::opt("--bind", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("new", "Create a skeleton project")
                .param(new_site())
                .program("pelican-quickstart")
                .arg(ArgPart::opt("--path", "path")),
        )
}

fn mkdocs() -> AdapterSpec {
    AdapterSpec::new("mkdocs", "Python", "mkdocs", PROFILE)
        .describe("MkDocs project documentation generator")
        .tool(
            ToolSpec::new("build", "Build the documentation")
                .param(ParamSpec::path("config").describe("Path to mkdocs.yml"))
                .param(output())
                .param(ParamSpec::flag("strict").describe("Abort on warnings"))
                .lits(["build"])
                .arg(ArgPart::opt("--config-file", "config"))
                .arg(ArgPart::opt("--site-dir", "output"))
                .arg(ArgPart::switch("--strict", "strict")),
        )
        .tool(
            ToolSpec::new("serve", "Run the live-reloading docs server")
                .param(ParamSpec::path("config").describe("Path to mkdocs.yml"))
                .param(ParamSpec::url("host").default_value("127.0.0.1").describe("Interface to bind"))
                .param(port(8000))
                .lits(["serve"])
                .arg(ArgPart::opt("--config-file", "config"))
                .lits(["--dev-addr"])
                .arg(ArgPart::expr("{host}:{port}")),
        )
        .tool(
            ToolSpec::new("new", "Create a new project")
                .param(new_site())
                .lits(["new"])
                .arg(ArgPart::value("path")),
        )
}

fn nikola() -> AdapterSpec {
    AdapterSpec::new("nikola", "Python", "nikola", PROFILE)
        .describe("Nikola static site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .workdir_param("source")
                .lits(["build"]),
        )
        .tool(
            ToolSpec::new("serve", "Serve the output directory")
                .param(source())
                .param(host())
                .param(port(8000))
                .workdir_param("source")
                .lits(["serve"])
                .arg(ArgPart::opt("--address", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("new", "Create a site without prompting")
                .param(new_site())
                .param(ParamSpec::flag("demo").describe("Include demo content"))
                .lits(["init", "--quiet"])
                .arg(ArgPart::switch("--demo", "demo"))
                .arg(ArgPart::value("path")),
        )
}

fn lektor() -> AdapterSpec {
    AdapterSpec::new("lektor", "Python", "lektor", PROFILE)
        .describe("Lektor static content management system")
        .tool(
            ToolSpec::new("build", "Build the project")
                .param(source())
                .param(output())
                .arg(ArgPart::opt("--project", "source"))
                .lits(["build"])
                .arg(ArgPart::opt("--output-path", "output")),
        )
        .tool(
            ToolSpec::new("serve", "Run the development server")
                .param(source())
                .param(host())
                .param(port(5000))
                .arg(ArgPart::opt("--project", "source"))
                .lits(["server"])
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("new", "Create a project from the quickstart template")
                .param(new_site())
                .lits(["quickstart"])
                .arg(ArgPart::opt("--path", "path")),
        )
}

fn sphinx() -> AdapterSpec {
    AdapterSpec::new("sphinx", "Python", "sphinx-build", PROFILE)
        .describe("Sphinx documentation generator")
        .tool(
            ToolSpec::new("build", "Build the documentation")
                .param(ParamSpec::path("source").default_value("docs").describe("Documentation sources"))
                .param(output().default_value("docs/_build/html"))
                .param(
                    ParamSpec::identifier("builder")
                        .default_value("html")
                        .describe("Builder name, e.g. html or latex"),
                )
                .param(ParamSpec::flag("warnings_as_errors").describe("Turn warnings into errors"))
                .arg(ArgPart::opt("-b", "builder"))
                .arg(ArgPart::switch("-W", "warnings_as_errors"))
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("output")),
        )
        .tool(
            ToolSpec::new("new", "Create documentation sources without prompting")
                .param(new_site())
                .param(
                    ParamSpec::string("project")
                        .required()
                        .max_len(120)
                        .describe("Project name"),
                )
                .param(ParamSpec::string("author").max_len(120).describe("Author name"))
                .program("sphinx-quickstart")
                .lits(["--quiet"])
                .arg(ArgPart::opt("--project", "project"))
                .arg(ArgPart::opt("--author", "author"))
                .arg(ArgPart::value("path")),
        )
}

// ── JavaScript ─────────────────────────────────────────────────────

fn eleventy() -> AdapterSpec {
    AdapterSpec::new("eleventy", "JavaScript", "eleventy", PROFILE)
        .describe("Eleventy static site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output())
                .arg(ArgPart::joined("--input", "source"))
                .arg(ArgPart::joined("--output", "output")),
        )
        .tool(
            ToolSpec::new("serve", "Build, watch and serve the site")
                .param(source())
                .param(port(8080))
                .arg(ArgPart::joined("--input", "source"))
                .lits(["--serve"])
                .arg(ArgPart::joined("--port", "port")),
        )
}

fn hexo() -> AdapterSpec {
    AdapterSpec::new("hexo", "JavaScript", "hexo", PROFILE)
        .describe("Hexo blog framework")
        .probe(ProbeSpec::args(["version"]))
        .tool(
            ToolSpec::new("build", "Generate static files")
                .param(source())
                .workdir_param("source")
                .lits(["generate"]),
        )
        .tool(
            ToolSpec::new("serve", "Run the local server")
                .param(source())
                .param(host())
                .param(port(4000))
                .param(drafts())
                .workdir_param("source")
                .lits(["server"])
                .arg(ArgPart::opt("--ip", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::switch("--draft", "drafts")),
        )
        .tool(
            ToolSpec::new("clean", "Remove the cache and generated files")
                .param(source())
                .workdir_param("source")
                .lits(["clean"]),
        )
        .tool(
            ToolSpec::new("new", "Initialize a blog")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
}

// ── PHP ────────────────────────────────────────────────────────────

fn environment() -> ParamSpec {
    ParamSpec::identifier("env")
        .default_value("prod")
        .describe("Environment to build for")
}

fn sculpin() -> AdapterSpec {
    AdapterSpec::new("sculpin", "PHP", "sculpin", PROFILE)
        .describe("Sculpin static site generator")
        .tool(
            ToolSpec::new("build", "Generate the site")
                .param(source())
                .param(environment())
                .workdir_param("source")
                .lits(["generate"])
                .arg(ArgPart::joined("--env", "env")),
        )
        .tool(
            ToolSpec::new("serve", "Generate, watch and serve the site")
                .param(source())
                .param(ParamSpec::identifier("env").default_value("dev").describe("Environment to build for"))
                .param(port(8000))
                .workdir_param("source")
                .lits(["generate", "--watch", "--server"])
                .arg(ArgPart::joined("--env", "env"))
                .arg(ArgPart::opt("--port", "port")),
        )
}

fn jigsaw() -> AdapterSpec {
    AdapterSpec::new("jigsaw", "PHP", "jigsaw", PROFILE)
        .describe("Jigsaw static site generator for Laravel Blade")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(ParamSpec::identifier("env").default_value("local").describe("Environment to build for"))
                .workdir_param("source")
                .lits(["build"])
                .arg(ArgPart::value("env")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the built site")
                .param(source())
                .param(ParamSpec::identifier("env").default_value("local").describe("Environment to serve"))
                .param(host())
                .param(port(8000))
                .workdir_param("source")
                .lits(["serve"])
                .arg(ArgPart::value("env"))
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("new", "Scaffold a new site in the working directory")
                .param(source())
                .workdir_param("source")
                .lits(["init"]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitewrap::config::FrameworkConfig;
    use sitewrap::runner::RecordingRunner;
    use std::sync::Arc;

    fn build(spec: AdapterSpec) -> sitewrap::adapter::Adapter {
        spec.build(&FrameworkConfig::default(), Arc::new(RecordingRunner::new()))
            .unwrap()
    }

    #[test]
    fn mkdocs_dev_addr_is_one_argument() {
        let spec = build(mkdocs())
            .prepare("serve", &json!({"port": 9000}))
            .unwrap();
        assert_eq!(spec.args, ["serve", "--dev-addr", "127.0.0.1:9000"]);
    }

    #[test]
    fn sphinx_quickstart_keeps_project_name_whole() {
        let spec = build(sphinx())
            .prepare("new", &json!({"path": "docs", "project": "My Project"}))
            .unwrap();
        assert_eq!(spec.program, "sphinx-quickstart");
        assert_eq!(spec.args, ["--quiet", "--project", "My Project", "docs"]);
    }

    #[test]
    fn sphinx_rejects_command_substitution_in_names() {
        let err = build(sphinx())
            .prepare("new", &json!({"path": "docs", "project": "$(reboot)"}))
            .unwrap_err();
        assert_eq!(err.kind(), sitewrap::error::ErrorKind::Validation);
    }
}
