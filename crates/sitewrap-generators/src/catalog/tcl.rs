//! Tcl generators, validated under the Tcl risk profile.

use super::{host, new_site, output, port, source};
use sitewrap::adapter::AdapterSpec;
use sitewrap::lifecycle::ProbeSpec;
use sitewrap::tools::{ArgPart, ToolSpec};
use sitewrap::validate::LanguageRiskProfile;

pub fn adapters() -> Vec<AdapterSpec> {
    vec![tclssg()]
}

fn tclssg() -> AdapterSpec {
    AdapterSpec::new("tclssg", "Tcl", "tclssg", LanguageRiskProfile::Tcl)
        .describe("Tclssg static site generator")
        .probe(ProbeSpec::args(["version"]))
        .tool(
            ToolSpec::new("new", "Create a project skeleton")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output().default_value("output"))
                .lits(["build"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("output")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the built site")
                .param(source())
                .param(output().default_value("output"))
                .param(host())
                .param(port(8080))
                .lits(["serve"])
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("output")),
        )
        .tool(
            ToolSpec::new("clean", "Delete the output directory contents")
                .param(source())
                .param(output().default_value("output"))
                .lits(["clean"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::value("output")),
        )
}
