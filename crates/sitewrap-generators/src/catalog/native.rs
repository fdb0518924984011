//! Generators shipped as standalone binaries.

use super::{base_url, drafts, host, new_site, output, port, source};
use sitewrap::adapter::AdapterSpec;
use sitewrap::lifecycle::ProbeSpec;
use sitewrap::tools::{ArgPart, ToolSpec};
use sitewrap::validate::{LanguageRiskProfile, ParamSpec};

const PROFILE: LanguageRiskProfile = LanguageRiskProfile::Shell;

pub fn adapters() -> Vec<AdapterSpec> {
    vec![hugo(), zola(), mdbook(), cobalt(), hakyll(), soupault(), bashblog()]
}

fn hugo() -> AdapterSpec {
    AdapterSpec::new("hugo", "Go", "hugo", PROFILE)
        .describe("Hugo static site generator")
        .probe(ProbeSpec::args(["version"]))
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output())
                .param(base_url())
                .param(drafts())
                .param(ParamSpec::flag("minify").describe("Minify the output"))
                .arg(ArgPart::opt("--source", "source"))
                .arg(ArgPart::opt("--destination", "output"))
                .arg(ArgPart::opt("--baseURL", "base_url"))
                .arg(ArgPart::switch("--buildDrafts", "drafts"))
                .arg(ArgPart::switch("--minify", "minify")),
        )
        .tool(
            ToolSpec::new("serve", "Run the development server")
                .param(source())
                .param(host())
                .param(port(1313))
                .param(drafts())
                .lits(["server"])
                .arg(ArgPart::opt("--source", "source"))
                .arg(ArgPart::opt("--bind", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::switch("--buildDrafts", "drafts")),
        )
        .tool(
            ToolSpec::new("new", "Create a new site skeleton")
                .param(new_site())
                .lits(["new", "site"])
                .arg(ArgPart::value("path")),
        )
}

fn zola() -> AdapterSpec {
    AdapterSpec::new("zola", "Rust", "zola", PROFILE)
        .describe("Zola static site engine")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output())
                .param(base_url())
                .param(drafts())
                .arg(ArgPart::opt("--root", "source"))
                .lits(["build"])
                .arg(ArgPart::opt("--output-dir", "output"))
                .arg(ArgPart::opt("--base-url", "base_url"))
                .arg(ArgPart::switch("--drafts", "drafts")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the site with live reload")
                .param(source())
                .param(host())
                .param(port(1111))
                .param(drafts())
                .arg(ArgPart::opt("--root", "source"))
                .lits(["serve"])
                .arg(ArgPart::opt("--interface", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::switch("--drafts", "drafts")),
        )
        .tool(
            ToolSpec::new("check", "Check links and templates without writing output")
                .param(source())
                .arg(ArgPart::opt("--root", "source"))
                .lits(["check"]),
        )
        .tool(
            ToolSpec::new("new", "Create a new site skeleton")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
}

fn mdbook() -> AdapterSpec {
    AdapterSpec::new("mdbook", "Rust", "mdbook", PROFILE)
        .describe("mdBook book generator")
        .tool(
            ToolSpec::new("build", "Build the book")
                .param(source())
                .param(output())
                .lits(["build"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::opt("--dest-dir", "output")),
        )
        .tool(
            ToolSpec::new("serve", "Serve the book with live reload")
                .param(source())
                .param(host())
                .param(port(3000))
                .lits(["serve"])
                .arg(ArgPart::value("source"))
                .arg(ArgPart::opt("--hostname", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("test", "Run the Rust code samples in the book")
                .param(source())
                .lits(["test"])
                .arg(ArgPart::value("source")),
        )
        .tool(
            ToolSpec::new("new", "Create a new book")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
}

fn cobalt() -> AdapterSpec {
    AdapterSpec::new("cobalt", "Rust", "cobalt", PROFILE)
        .describe("Cobalt static site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(output())
                .param(drafts())
                .workdir_param("source")
                .lits(["build"])
                .arg(ArgPart::opt("--destination", "output"))
                .arg(ArgPart::switch("--drafts", "drafts")),
        )
        .tool(
            ToolSpec::new("serve", "Build and serve the site")
                .param(source())
                .param(host())
                .param(port(3000))
                .param(drafts())
                .workdir_param("source")
                .lits(["serve"])
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port"))
                .arg(ArgPart::switch("--drafts", "drafts")),
        )
        .tool(
            ToolSpec::new("new", "Create a new site skeleton")
                .param(new_site())
                .lits(["init"])
                .arg(ArgPart::value("path")),
        )
}

fn hakyll() -> AdapterSpec {
    AdapterSpec::new("hakyll", "Haskell", "stack", PROFILE)
        .describe("Hakyll site compiler, run through stack")
        .tool(
            ToolSpec::new("build", "Compile the site")
                .param(source())
                .workdir_param("source")
                .lits(["exec", "site", "--", "build"]),
        )
        .tool(
            ToolSpec::new("serve", "Watch and serve the site")
                .param(source())
                .param(host())
                .param(port(8000))
                .workdir_param("source")
                .lits(["exec", "site", "--", "watch"])
                .arg(ArgPart::opt("--host", "host"))
                .arg(ArgPart::opt("--port", "port")),
        )
        .tool(
            ToolSpec::new("clean", "Remove the cache and output directories")
                .param(source())
                .workdir_param("source")
                .lits(["exec", "site", "--", "clean"]),
        )
        .tool(
            ToolSpec::new("new", "Create a site from the hakyll-init template")
                .param(new_site())
                .program("hakyll-init")
                .arg(ArgPart::value("path")),
        )
}

fn soupault() -> AdapterSpec {
    AdapterSpec::new("soupault", "OCaml", "soupault", PROFILE)
        .describe("Soupault HTML processor and site generator")
        .tool(
            ToolSpec::new("build", "Build the site")
                .param(source())
                .param(ParamSpec::path("site_dir").describe("Directory with page sources"))
                .param(output())
                .workdir_param("source")
                .arg(ArgPart::opt("--site-dir", "site_dir"))
                .arg(ArgPart::opt("--build-dir", "output")),
        )
        .tool(
            ToolSpec::new("new", "Create a default configuration and directories")
                .param(source())
                .workdir_param("source")
                .lits(["--init"]),
        )
}

fn bashblog() -> AdapterSpec {
    AdapterSpec::new("bashblog", "Bash", "bb.sh", PROFILE)
        .describe("bashblog single-script blog generator")
        // bb.sh has no version flag; usage output exits 1.
        .probe(ProbeSpec::args(Vec::<String>::new()).lenient(&[1]))
        .tool(
            ToolSpec::new("build", "Rebuild every post and index page")
                .param(source())
                .workdir_param("source")
                .lits(["rebuild"]),
        )
        .tool(
            ToolSpec::new("list", "List the posts with their numbers")
                .param(source())
                .workdir_param("source")
                .lits(["list"]),
        )
        .tool(
            ToolSpec::new("tags", "List tags with post counts")
                .param(source())
                .workdir_param("source")
                .lits(["tags"]),
        )
}
