//! The built-in generator adapters.
//!
//! Every adapter here is configuration data: identity, binary, risk profile,
//! probe, and tool specs with argument templates. Nothing in this module
//! spawns a process; [`crate::config::HubConfig::build_adapters`] turns the
//! specs into live adapters.

pub mod julia;
pub mod lisp;
pub mod native;
pub mod scripting;
pub mod tcl;

use sitewrap::adapter::AdapterSpec;
use sitewrap::validate::ParamSpec;

/// All built-in adapter specs, grouped by ecosystem.
pub fn all() -> Vec<AdapterSpec> {
    let mut specs = Vec::with_capacity(28);
    specs.extend(lisp::adapters());
    specs.extend(tcl::adapters());
    specs.extend(julia::adapters());
    specs.extend(native::adapters());
    specs.extend(scripting::adapters());
    specs
}

/// Look up one built-in spec by adapter name.
pub fn find(name: &str) -> Option<AdapterSpec> {
    all().into_iter().find(|spec| spec.name == name)
}

// ── Shared parameters ──────────────────────────────────────────────

pub(crate) fn source() -> ParamSpec {
    ParamSpec::path("source")
        .default_value(".")
        .describe("Site source directory")
}

pub(crate) fn output() -> ParamSpec {
    ParamSpec::path("output").describe("Directory to write the generated site to")
}

pub(crate) fn port(default: u16) -> ParamSpec {
    ParamSpec::port("port")
        .default_value(default)
        .describe("Port for the preview server")
}

pub(crate) fn host() -> ParamSpec {
    ParamSpec::url("host").describe("Interface the preview server binds to")
}

pub(crate) fn drafts() -> ParamSpec {
    ParamSpec::flag("drafts").describe("Include draft content")
}

pub(crate) fn base_url() -> ParamSpec {
    ParamSpec::url("base_url").describe("Base URL the site is served from")
}

pub(crate) fn new_site() -> ParamSpec {
    ParamSpec::path("path")
        .required()
        .describe("Directory to create the new site in")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn twenty_eight_unique_adapters() {
        let specs = all();
        assert_eq!(specs.len(), 28);
        let names: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 28);
    }

    #[test]
    fn every_adapter_can_build() {
        for spec in all() {
            assert!(
                spec.tools.iter().any(|t| t.name == "build"),
                "{} has no build tool",
                spec.name
            );
        }
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find("hugo").unwrap().binary, "hugo");
        assert!(find("nope").is_none());
    }
}
