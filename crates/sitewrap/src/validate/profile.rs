//! Per-ecosystem risk profiles.
//!
//! Each wrapped generator belongs to one profile. The profile decides which
//! characters are dangerous in the target language (and therefore rejected
//! outright) and which punctuation free-form strings may carry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Punctuation free-form strings may contain before the profile's
/// forbidden set is subtracted.
const STRING_PUNCTUATION: &[char] = &[
    '.', ',', '-', '_', ':', '/', '@', '+', '=', '!', '?', '%', '&', '\'', '#', '(', ')',
];

/// Target-language risk profile shared by every adapter of an ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LanguageRiskProfile {
    /// Lisp family (Common Lisp, Clojure, Racket, Guile, Emacs Lisp).
    Lisp,
    /// Tcl, where brackets and dollar signs trigger substitution.
    Tcl,
    /// Julia and POSIX-shell style tools. Also the profile for generators
    /// driven purely through command-line flags.
    #[serde(alias = "julia")]
    Shell,
}

impl LanguageRiskProfile {
    pub const ALL: [LanguageRiskProfile; 3] = [Self::Lisp, Self::Tcl, Self::Shell];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lisp => "lisp",
            Self::Tcl => "tcl",
            Self::Shell => "shell",
        }
    }

    /// Characters rejected in any validated value for this profile.
    pub fn forbidden(self) -> &'static [char] {
        match self {
            Self::Lisp => &['(', ')', '"', '`', '\'', '#', '|'],
            Self::Tcl => &['[', ']', '$', '\\', '{', '}', ';'],
            Self::Shell => &[';', '`', '$', '(', ')', '\\', '"'],
        }
    }

    /// First forbidden character in `value`, if any.
    pub fn find_forbidden(self, value: &str) -> Option<char> {
        let forbidden = self.forbidden();
        value.chars().find(|c| forbidden.contains(c))
    }

    /// Whether `c` may appear in a sanitized free-form string.
    pub fn allows_in_string(self, c: char) -> bool {
        if self.forbidden().contains(&c) {
            return false;
        }
        c.is_alphanumeric() || c == ' ' || STRING_PUNCTUATION.contains(&c)
    }
}

impl std::fmt::Display for LanguageRiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
