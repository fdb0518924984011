//! Category validators.
//!
//! Each validator maps one raw caller-supplied value to a sanitized value or
//! a [`ValidationError`]. They are pure and share no state. Errors are raised
//! under the category name; [`ParamSpec`](super::ParamSpec) relabels them with
//! the parameter name.
//!
//! Rejection messages describe the problem (and name the offending character
//! where there is one) but never repeat the rejected value.

use super::LanguageRiskProfile;
use crate::error::ValidationError;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Default maximum length of a sanitized free-form string, in characters.
pub const DEFAULT_MAX_STRING_LEN: usize = 1024;

static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._/-]+$").expect("valid regex"));
static PATH_WITH_SPACES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._/ -]+$").expect("valid regex"));
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9./:@-]+$").expect("valid regex"));

// ── Path ───────────────────────────────────────────────────────────

/// Validate a filesystem path.
///
/// Missing, `null`, or blank input becomes `"."`. Numbers are accepted and
/// rendered as text. Checks run in order: traversal, profile metacharacters,
/// leading dash, then the allow-list (alphanumerics, `.`, `-`, `_`, `/`, and
/// spaces when `allow_spaces` is set).
pub fn validate_path(
    raw: Option<&Value>,
    profile: LanguageRiskProfile,
    allow_spaces: bool,
) -> Result<String, ValidationError> {
    let text = match raw {
        None | Some(Value::Null) => return Ok(".".to_string()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(reject("path", "must be a string")),
    };
    if text.is_empty() {
        return Ok(".".to_string());
    }
    if text.contains("..") {
        return Err(reject("path", "directory traversal ('..') is not allowed"));
    }
    if let Some(c) = profile.find_forbidden(&text) {
        return Err(forbidden_char("path", c, profile));
    }
    if text.starts_with('-') {
        return Err(reject("path", "must not begin with '-'"));
    }
    let allowed = if allow_spaces {
        &*PATH_WITH_SPACES_RE
    } else {
        &*PATH_RE
    };
    if !allowed.is_match(&text) {
        let extra = if allow_spaces { ", spaces" } else { "" };
        return Err(reject(
            "path",
            format!("may only contain letters, digits, '.', '-', '_', '/'{extra}"),
        ));
    }
    Ok(text)
}

// ── Port ───────────────────────────────────────────────────────────

/// Validate a TCP port. Accepts JSON integers and decimal strings.
pub fn validate_port(raw: Option<&Value>) -> Result<u16, ValidationError> {
    let number: i64 = match raw {
        None | Some(Value::Null) => return Err(reject("port", "is required")),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => f as i64,
            _ => return Err(reject("port", "must be an integer")),
        },
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(reject("port", "must be an integer"));
            }
            s.parse()
                .map_err(|_| reject("port", "must be between 1 and 65535"))?
        }
        Some(_) => return Err(reject("port", "must be an integer")),
    };
    u16::try_from(number)
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| reject("port", "must be between 1 and 65535"))
}

// ── Identifier ─────────────────────────────────────────────────────

/// Validate a symbol that will be interpolated into generated source.
///
/// The value passes through unchanged; no trimming or case folding.
pub fn validate_identifier(raw: Option<&Value>) -> Result<String, ValidationError> {
    let text = require_str("identifier", raw)?;
    if IDENTIFIER_RE.is_match(text) {
        Ok(text.to_string())
    } else {
        Err(reject(
            "identifier",
            "must start with a letter or '_' and contain only letters, digits, '_'",
        ))
    }
}

// ── URL ────────────────────────────────────────────────────────────

/// Validate a repository or URL-like string against a narrow character class.
pub fn validate_url(
    raw: Option<&Value>,
    profile: LanguageRiskProfile,
) -> Result<String, ValidationError> {
    let text = require_str("url", raw)?.trim();
    if text.is_empty() {
        return Err(reject("url", "must not be empty"));
    }
    if let Some(c) = profile.find_forbidden(text) {
        return Err(forbidden_char("url", c, profile));
    }
    if text.starts_with('-') {
        return Err(reject("url", "must not begin with '-'"));
    }
    if !URL_RE.is_match(text) {
        return Err(reject(
            "url",
            "may only contain letters, digits, '.', '-', '/', ':', '@'",
        ));
    }
    Ok(text.to_string())
}

// ── Free-form string ───────────────────────────────────────────────

/// Sanitize free-form text such as a post title.
///
/// Allow-list first: control characters and the profile's metacharacters
/// are rejected, as is anything outside letters, digits, spaces, and the
/// profile's permitted punctuation. Nothing is escaped.
pub fn sanitize_string(
    raw: Option<&Value>,
    profile: LanguageRiskProfile,
    max_len: usize,
) -> Result<String, ValidationError> {
    let text = require_str("string", raw)?;
    if text.chars().count() > max_len {
        return Err(reject(
            "string",
            format!("must be at most {max_len} characters"),
        ));
    }
    if text.starts_with('-') {
        return Err(reject("string", "must not begin with '-'"));
    }
    if text.chars().any(char::is_control) {
        return Err(reject("string", "contains a control character"));
    }
    if let Some(c) = profile.find_forbidden(text) {
        return Err(forbidden_char("string", c, profile));
    }
    if let Some(c) = text.chars().find(|c| !profile.allows_in_string(*c)) {
        return Err(reject("string", format!("character '{c}' is not allowed")));
    }
    Ok(text.to_string())
}

// ── Flag ───────────────────────────────────────────────────────────

/// Validate a boolean switch. Accepts JSON booleans and `"true"`/`"false"`.
pub fn validate_flag(raw: Option<&Value>) -> Result<bool, ValidationError> {
    match raw {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        None | Some(Value::Null) => Err(reject("flag", "is required")),
        Some(_) => Err(reject("flag", "must be true or false")),
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn reject(category: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::new(category, reason)
}

fn forbidden_char(category: &str, c: char, profile: LanguageRiskProfile) -> ValidationError {
    let shown = match c {
        '\\' => "\\\\".to_string(),
        _ => c.to_string(),
    };
    reject(
        category,
        format!("character '{shown}' is not allowed for {profile} tools"),
    )
}

fn require_str<'a>(category: &str, raw: Option<&'a Value>) -> Result<&'a str, ValidationError> {
    match raw {
        Some(Value::String(s)) => Ok(s),
        None | Some(Value::Null) => Err(reject(category, "is required")),
        Some(_) => Err(reject(category, "must be a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHELL: LanguageRiskProfile = LanguageRiskProfile::Shell;

    fn path(v: Value) -> Result<String, ValidationError> {
        validate_path(Some(&v), SHELL, false)
    }

    #[test]
    fn missing_path_is_current_dir() {
        assert_eq!(validate_path(None, SHELL, false).unwrap(), ".");
        assert_eq!(path(Value::Null).unwrap(), ".");
        assert_eq!(path(json!("   ")).unwrap(), ".");
    }

    #[test]
    fn traversal_is_rejected() {
        let err = path(json!("../../etc")).unwrap_err();
        assert!(err.reason.contains("traversal"), "{err}");
        assert!(path(json!("site/../secret")).is_err());
        assert!(path(json!("..")).is_err());
    }

    #[test]
    fn ordinary_paths_pass_trimmed() {
        assert_eq!(path(json!(" content/posts ")).unwrap(), "content/posts");
        assert_eq!(path(json!("/srv/www/public_html")).unwrap(), "/srv/www/public_html");
        assert_eq!(path(json!(2024)).unwrap(), "2024");
    }

    #[test]
    fn path_metacharacter_named_not_value() {
        let err = validate_path(Some(&json!("out`rm -rf`")), SHELL, false).unwrap_err();
        assert!(err.reason.contains("'`'"));
        assert!(!err.reason.contains("rm -rf"));

        let err = validate_path(Some(&json!("a(b)")), LanguageRiskProfile::Lisp, false)
            .unwrap_err();
        assert!(err.reason.contains("lisp"));
    }

    #[test]
    fn path_spaces_only_when_declared() {
        assert!(path(json!("My Site")).is_err());
        assert_eq!(
            validate_path(Some(&json!("My Site")), SHELL, true).unwrap(),
            "My Site"
        );
    }

    #[test]
    fn path_rejects_option_lookalike_and_odd_chars() {
        assert!(path(json!("--config=evil")).is_err());
        assert!(path(json!("a*b")).is_err());
        assert!(path(json!("a\nb")).is_err());
        assert!(path(json!(["a"])).is_err());
        assert!(path(json!(true)).is_err());
    }

    #[test]
    fn ports() {
        assert_eq!(validate_port(Some(&json!("8080"))).unwrap(), 8080);
        assert_eq!(validate_port(Some(&json!(1))).unwrap(), 1);
        assert_eq!(validate_port(Some(&json!(65535))).unwrap(), 65535);
        assert_eq!(validate_port(Some(&json!(4000.0))).unwrap(), 4000);
        assert!(validate_port(Some(&json!("99999"))).is_err());
        assert!(validate_port(Some(&json!(0))).is_err());
        assert!(validate_port(Some(&json!(-80))).is_err());
        assert!(validate_port(Some(&json!("80a"))).is_err());
        assert!(validate_port(Some(&json!("-1"))).is_err());
        assert!(validate_port(Some(&json!(80.5))).is_err());
        assert!(validate_port(Some(&json!("99999999999999999999999"))).is_err());
        assert!(validate_port(None).is_err());
    }

    #[test]
    fn identifiers() {
        assert_eq!(
            validate_identifier(Some(&json!("MyModule_2"))).unwrap(),
            "MyModule_2"
        );
        assert_eq!(validate_identifier(Some(&json!("_private"))).unwrap(), "_private");
        assert!(validate_identifier(Some(&json!("2bad"))).is_err());
        assert!(validate_identifier(Some(&json!("has-dash"))).is_err());
        assert!(validate_identifier(Some(&json!(" Padded"))).is_err());
        assert!(validate_identifier(Some(&json!(""))).is_err());
        assert!(validate_identifier(Some(&json!(7))).is_err());
    }

    #[test]
    fn urls() {
        assert_eq!(
            validate_url(Some(&json!("git@github.com:user/theme.git")), SHELL).unwrap(),
            "git@github.com:user/theme.git"
        );
        assert_eq!(
            validate_url(Some(&json!("https://example.org/base")), SHELL).unwrap(),
            "https://example.org/base"
        );
        assert!(validate_url(Some(&json!("https://x.org/?q=1")), SHELL).is_err());
        assert!(validate_url(Some(&json!("http://a b")), SHELL).is_err());
        assert!(validate_url(Some(&json!("-oProxyCommand")), SHELL).is_err());
        assert!(validate_url(Some(&json!("")), SHELL).is_err());
    }

    #[test]
    fn strings_allow_list() {
        assert_eq!(
            sanitize_string(Some(&json!("Hello, world!")), SHELL, 64).unwrap(),
            "Hello, world!"
        );
        assert_eq!(
            sanitize_string(Some(&json!("Café notes")), SHELL, 64).unwrap(),
            "Café notes"
        );
        assert!(sanitize_string(Some(&json!("tab\there")), SHELL, 64).is_err());
        assert!(sanitize_string(Some(&json!("a > b")), SHELL, 64).is_err());
        assert!(sanitize_string(Some(&json!("say \"hi\"")), SHELL, 64).is_err());
        assert!(sanitize_string(Some(&json!("abcdef")), SHELL, 5).is_err());
    }

    #[test]
    fn strings_cannot_pose_as_options() {
        let err = sanitize_string(Some(&json!("-rf")), SHELL, 64).unwrap_err();
        assert_eq!(err.reason, "must not begin with '-'");
        assert!(sanitize_string(Some(&json!("--output=/etc")), SHELL, 64).is_err());
        assert_eq!(
            sanitize_string(Some(&json!("Part one - intro")), SHELL, 64).unwrap(),
            "Part one - intro"
        );
    }

    #[test]
    fn strings_follow_profile() {
        let tcl = LanguageRiskProfile::Tcl;
        let lisp = LanguageRiskProfile::Lisp;
        assert!(sanitize_string(Some(&json!("Notes (draft)")), tcl, 64).is_ok());
        assert!(sanitize_string(Some(&json!("Notes (draft)")), lisp, 64).is_err());
        assert!(sanitize_string(Some(&json!("[puts hi]")), tcl, 64).is_err());
    }

    #[test]
    fn flags() {
        assert!(validate_flag(Some(&json!(true))).unwrap());
        assert!(!validate_flag(Some(&json!("false"))).unwrap());
        assert!(validate_flag(Some(&json!("TRUE"))).unwrap());
        assert!(validate_flag(Some(&json!(1))).is_err());
    }
}
