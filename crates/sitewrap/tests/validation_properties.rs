//! Property tests for the validator set and the "rejected input never runs"
//! guarantee.

use proptest::prelude::*;
use serde_json::{Value, json};
use sitewrap::prelude::*;
use sitewrap::validate::{validate_identifier, validate_path, validate_port};
use std::sync::Arc;

fn profile() -> impl Strategy<Value = LanguageRiskProfile> {
    prop::sample::select(LanguageRiskProfile::ALL.to_vec())
}

fn adapter_with(runner: Arc<RecordingRunner>, profile: LanguageRiskProfile) -> Adapter {
    AdapterSpec::new("probe-target", "Test", "true", profile)
        .probe(ProbeSpec::args(Vec::<String>::new()))
        .tool(
            ToolSpec::new("build", "Build")
                .param(ParamSpec::path("source"))
                .param(ParamSpec::string("title"))
                .arg(ArgPart::opt("--source", "source"))
                .arg(ArgPart::opt("--title", "title")),
        )
        .build(&FrameworkConfig::default(), runner)
        .unwrap()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #[test]
    fn traversal_always_fails(prefix in ".{0,20}", suffix in ".{0,20}", profile in profile()) {
        let raw = json!(format!("{prefix}..{suffix}"));
        prop_assert!(validate_path(Some(&raw), profile, true).is_err());
    }

    #[test]
    fn in_range_ports_round_trip(port in 1u16..=65535) {
        prop_assert_eq!(validate_port(Some(&json!(port))).unwrap(), port);
        prop_assert_eq!(validate_port(Some(&json!(port.to_string()))).unwrap(), port);
    }

    #[test]
    fn out_of_range_ports_fail(n in prop_oneof![i64::MIN..=0i64, 65536i64..=i64::MAX]) {
        prop_assert!(validate_port(Some(&json!(n))).is_err());
        prop_assert!(validate_port(Some(&json!(n.to_string()))).is_err());
    }

    #[test]
    fn non_numeric_ports_fail(s in "[^0-9]{1,10}") {
        prop_assert!(validate_port(Some(&json!(s))).is_err());
    }

    #[test]
    fn valid_identifiers_are_unchanged(id in "[A-Za-z_][A-Za-z0-9_]{0,30}") {
        let once = validate_identifier(Some(&json!(id.clone()))).unwrap();
        prop_assert_eq!(&once, &id);
        let twice = validate_identifier(Some(&Value::String(once))).unwrap();
        prop_assert_eq!(twice, id);
    }

    #[test]
    fn invalid_identifiers_fail(id in "[0-9-][A-Za-z0-9_]{0,10}|[A-Za-z_]{1,5}[^A-Za-z0-9_][A-Za-z0-9_]{0,5}") {
        prop_assert!(validate_identifier(Some(&json!(id))).is_err());
    }

    #[test]
    fn metacharacters_never_reach_runner(
        profile in profile(),
        index in any::<prop::sample::Index>(),
        head in "[a-z]{0,8}",
        tail in "[a-z/]{0,8}",
        as_title in any::<bool>(),
    ) {
        let forbidden = profile.forbidden();
        let c = forbidden[index.index(forbidden.len())];
        let value = format!("{head}{c}{tail}");
        let params = if as_title {
            json!({"title": value})
        } else {
            json!({"source": value})
        };

        let runner = Arc::new(RecordingRunner::new());
        let adapter = adapter_with(runner.clone(), profile);
        let result = block_on(adapter.call("build", &params));

        prop_assert!(!result.success);
        prop_assert_eq!(result.code, 1);
        prop_assert!(!result.stderr.is_empty());
        prop_assert_eq!(runner.call_count(), 0);
    }
}

#[test]
fn end_to_end_examples() {
    let shell = LanguageRiskProfile::Shell;
    assert_eq!(validate_path(None, shell, false).unwrap(), ".");
    let err = validate_path(Some(&json!("../../etc")), shell, false).unwrap_err();
    assert!(err.reason.contains("traversal"));
    assert_eq!(validate_port(Some(&json!("8080"))).unwrap(), 8080);
    assert!(validate_port(Some(&json!("99999"))).is_err());
    assert_eq!(
        validate_identifier(Some(&json!("MyModule_2"))).unwrap(),
        "MyModule_2"
    );
    assert!(validate_identifier(Some(&json!("2bad"))).is_err());
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_runner() {
    let runner = Arc::new(RecordingRunner::new());
    let adapter = AdapterSpec::new("franklin", "Julia", "julia", LanguageRiskProfile::Shell)
        .tool(
            ToolSpec::new("new", "Create a site")
                .param(ParamSpec::identifier("name").required())
                .arg(ArgPart::lit("-e"))
                .arg(ArgPart::expr("using Franklin; newsite(\"{name}\")")),
        )
        .build(&FrameworkConfig::default(), runner.clone())
        .unwrap();

    let result = adapter.call("new", &json!({})).await;
    assert!(!result.success);
    assert_eq!(result.code, 1);
    assert!(result.stderr.contains("name"));
    assert_eq!(runner.call_count(), 0);
}
