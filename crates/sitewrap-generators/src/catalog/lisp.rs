//! Lisp-family generators, validated under the Lisp risk profile.

use super::{output, port, source};
use sitewrap::adapter::AdapterSpec;
use sitewrap::lifecycle::ProbeSpec;
use sitewrap::tools::{ArgPart, ToolSpec};
use sitewrap::validate::{LanguageRiskProfile, ParamSpec};

const PROFILE: LanguageRiskProfile = LanguageRiskProfile::Lisp;

pub fn adapters() -> Vec<AdapterSpec> {
    vec![coleslaw(), cryogen(), frog(), pollen(), haunt(), org_publish()]
}

fn coleslaw() -> AdapterSpec {
    AdapterSpec::new("coleslaw", "Common Lisp", "sbcl", PROFILE)
        .describe("Coleslaw blog engine, driven through SBCL")
        .tool(
            ToolSpec::new("build", "Build and deploy the blog described by .coleslawrc")
                .param(source())
                .lits(["--non-interactive", "--eval", "(ql:quickload :coleslaw)", "--eval"])
                .arg(ArgPart::expr("(coleslaw:main \"{source}/\")")),
        )
}

fn cryogen() -> AdapterSpec {
    AdapterSpec::new("cryogen", "Clojure", "lein", PROFILE)
        .describe("Cryogen static site generator, driven through Leiningen")
        .probe(ProbeSpec::args(["version"]))
        .tool(
            ToolSpec::new("build", "Compile the site")
                .param(source())
                .workdir_param("source")
                .lits(["run"]),
        )
        .tool(
            ToolSpec::new("serve", "Serve the site with live reload")
                .param(source())
                .workdir_param("source")
                .lits(["serve"]),
        )
        .tool(
            ToolSpec::new("new", "Create a site from the cryogen template")
                .param(ParamSpec::identifier("name").required().describe("Project name"))
                .lits(["new", "cryogen"])
                .arg(ArgPart::value("name")),
        )
}

fn frog() -> AdapterSpec {
    AdapterSpec::new("frog", "Racket", "raco", PROFILE)
        .describe("Frog static blog generator")
        .probe(ProbeSpec::args(["--version"]).program("racket"))
        .tool(
            ToolSpec::new("build", "Generate the blog")
                .param(source())
                .workdir_param("source")
                .lits(["frog", "-b"]),
        )
        .tool(
            ToolSpec::new("serve", "Generate and preview the blog")
                .param(source())
                .param(port(3000))
                .workdir_param("source")
                .lits(["frog"])
                .arg(ArgPart::opt("--port", "port"))
                .lits(["-p"]),
        )
        .tool(
            ToolSpec::new("new", "Create a starter blog in the working directory")
                .param(source())
                .workdir_param("source")
                .lits(["frog", "--init"]),
        )
}

fn pollen() -> AdapterSpec {
    AdapterSpec::new("pollen", "Racket", "raco", PROFILE)
        .describe("Pollen publishing system")
        .probe(ProbeSpec::args(["--version"]).program("racket"))
        .tool(
            ToolSpec::new("build", "Render every source in the project")
                .param(source())
                .lits(["pollen", "render", "-r"])
                .arg(ArgPart::value("source")),
        )
        .tool(
            ToolSpec::new("serve", "Start the project server")
                .param(source())
                .param(port(8080))
                .lits(["pollen", "start"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("port")),
        )
        .tool(
            ToolSpec::new("publish", "Copy the rendered project to a publish directory")
                .param(source())
                .param(output().required())
                .lits(["pollen", "publish"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("output")),
        )
}

fn haunt() -> AdapterSpec {
    AdapterSpec::new("haunt", "Guile Scheme", "haunt", PROFILE)
        .describe("Haunt static site generator")
        .tool(
            ToolSpec::new("build", "Build the site from haunt.scm")
                .param(source())
                .workdir_param("source")
                .lits(["build"]),
        )
        .tool(
            ToolSpec::new("serve", "Serve the built site")
                .param(source())
                .param(port(8080))
                .param(ParamSpec::flag("watch").describe("Rebuild when files change"))
                .workdir_param("source")
                .lits(["serve"])
                .arg(ArgPart::joined("--port", "port"))
                .arg(ArgPart::switch("--watch", "watch")),
        )
}

fn org_publish() -> AdapterSpec {
    AdapterSpec::new("org-publish", "Emacs Lisp", "emacs", PROFILE)
        .describe("Org mode publishing, driven through batch Emacs")
        .tool(
            ToolSpec::new("build", "Publish every project defined in the config file")
                .param(source())
                .param(
                    ParamSpec::path("config")
                        .default_value("publish.el")
                        .describe("Elisp file defining org-publish-project-alist"),
                )
                .workdir_param("source")
                .lits(["--batch", "--load"])
                .arg(ArgPart::value("config"))
                .lits(["--eval", "(org-publish-all t)"]),
        )
        .tool(
            ToolSpec::new("publish_project", "Publish one named project")
                .param(source())
                .param(
                    ParamSpec::path("config")
                        .default_value("publish.el")
                        .describe("Elisp file defining org-publish-project-alist"),
                )
                .param(ParamSpec::identifier("project").required().describe("Project name"))
                .workdir_param("source")
                .lits(["--batch", "--load"])
                .arg(ArgPart::value("config"))
                .lits(["--eval"])
                .arg(ArgPart::expr("(org-publish-project \"{project}\" t)")),
        )
}
