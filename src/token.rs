// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Placeholder token matching.
//!
//! Every template that sprout can clone carries a fixed __placeholder token__,
//! the identifier `trex`. The token shows up under several spellings across
//! file names and source text: `trex`, `Trex`, `TREX`, `rh-trex`, `RH-Trex`,
//! `rhtrex`, and so on. All of these spellings are recognized by a single
//! fuzzy pattern, and every match collapses into one substitution target: the
//! name of the new project.
//!
//! # Token Pattern
//!
//! The pattern is an optional `r` variant marker, an optional `h` variant
//! marker, an optional hyphen, and then the identifier `trex` spelled with any
//! mixture of upper and lower case letters. Matching is ASCII case-insensitive
//! across the whole token, and leftmost matches are always as long as possible.
//!
//! # Case Policy
//!
//! What a match turns into is decided by a [`CasePolicy`]. The default policy
//! is [`CasePolicy::Literal`], where the replacement is always the new name
//! exactly as supplied. [`CasePolicy::Preserve`] maps the casing of the
//! matched identifier onto the new name instead. Variant markers are always
//! discarded regardless of policy.

use heck::ToUpperCamelCase;
use regex::{bytes, Regex};
use std::{
    borrow::Cow,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
    sync::LazyLock,
};

const TOKEN_PATTERN: &str = r"(?i-u)(?P<marker>r?h?-?)(?P<ident>trex)";

static TOKEN_STR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TOKEN_PATTERN).expect("token pattern must compile"));

static TOKEN_BYTES: LazyLock<bytes::Regex> =
    LazyLock::new(|| bytes::Regex::new(TOKEN_PATTERN).expect("token pattern must compile"));

/// Policy deciding how a matched token is spelled after substitution.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CasePolicy {
    /// Replace every match with the new name verbatim.
    #[default]
    Literal,

    /// Map the casing of the matched identifier onto the new name.
    ///
    /// | matched  | replacement                  |
    /// |----------|------------------------------|
    /// | `trex`   | new name in lower case       |
    /// | `TREX`   | new name in upper case       |
    /// | `Trex`   | new name in upper camel case |
    /// | `tReX`   | new name verbatim            |
    Preserve,
}

impl CasePolicy {
    /// Spell `name` for a matched identifier according to this policy.
    pub fn apply(&self, ident: &[u8], name: &str) -> String {
        match self {
            Self::Literal => name.to_owned(),
            Self::Preserve => match Casing::of(ident) {
                Casing::Lower => name.to_lowercase(),
                Casing::Upper => name.to_uppercase(),
                Casing::Title => name.to_upper_camel_case(),
                Casing::Mixed => name.to_owned(),
            },
        }
    }
}

impl FromStr for CasePolicy {
    type Err = UnknownCasePolicy;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.to_ascii_lowercase().as_str() {
            "literal" => Ok(Self::Literal),
            "preserve" => Ok(Self::Preserve),
            _ => Err(UnknownCasePolicy(data.to_owned())),
        }
    }
}

impl Display for CasePolicy {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Literal => fmt.write_str("literal"),
            Self::Preserve => fmt.write_str("preserve"),
        }
    }
}

/// Case policy name could not be recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown case policy {0:?}, expected \"literal\" or \"preserve\"")]
pub struct UnknownCasePolicy(String);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Casing {
    Lower,
    Upper,
    Title,
    Mixed,
}

impl Casing {
    fn of(ident: &[u8]) -> Self {
        match ident.split_first() {
            Some(_) if ident.iter().all(u8::is_ascii_lowercase) => Self::Lower,
            Some(_) if ident.iter().all(u8::is_ascii_uppercase) => Self::Upper,
            Some((head, tail))
                if head.is_ascii_uppercase() && tail.iter().all(u8::is_ascii_lowercase) =>
            {
                Self::Title
            }
            _ => Self::Mixed,
        }
    }
}

/// Fuzzy matcher for the placeholder token.
///
/// Cheap to construct and copy. The underlying patterns are compiled once and
/// shared by every matcher.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct TokenMatcher {
    policy: CasePolicy,
}

impl TokenMatcher {
    /// Construct new token matcher using target case policy.
    pub fn new(policy: CasePolicy) -> Self {
        Self { policy }
    }

    /// Check if text contains the placeholder token in any spelling.
    pub fn is_match(&self, text: &str) -> bool {
        TOKEN_STR.is_match(text)
    }

    /// Replace every token match in `text` with `name`.
    ///
    /// Returns borrowed input when nothing matched.
    pub fn replace<'t>(&self, text: &'t str, name: &str) -> Cow<'t, str> {
        TOKEN_STR.replace_all(text, |caps: &regex::Captures<'_>| {
            self.policy.apply(caps["ident"].as_bytes(), name)
        })
    }

    /// Replace every token match in raw bytes with `name`.
    ///
    /// Bytes outside of matches are left exactly as they are, valid UTF-8 or
    /// not.
    pub fn replace_bytes<'t>(&self, text: &'t [u8], name: &str) -> Cow<'t, [u8]> {
        TOKEN_BYTES.replace_all(text, |caps: &bytes::Captures<'_>| {
            self.policy.apply(&caps["ident"], name).into_bytes()
        })
    }
}

/// Replace every token match in `text` with `name` verbatim.
pub fn match_and_replace<'t>(text: &'t str, name: &str) -> Cow<'t, str> {
    TokenMatcher::default().replace(text, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("package trex", "package myapp"; "lower identifier")]
    #[test_case("# RH-Trex Service", "# myapp Service"; "prefixed title")]
    #[test_case("RH-TREX.md", "myapp.md"; "prefixed upper")]
    #[test_case("rhtrex rh-trex h-trex r-trex -trex", "myapp myapp myapp myapp myapp"; "every marker form")]
    #[test_case("tReX", "myapp"; "mixed case")]
    #[test_case("nothing to see here", "nothing to see here"; "no match")]
    #[test_case("TrexService.trex()", "myappService.myapp()"; "embedded in identifiers")]
    #[test]
    fn literal_replacement(input: &str, expect: &str) {
        pretty_assertions::assert_eq!(match_and_replace(input, "myapp"), expect);
    }

    #[test_case("trex", "my-app"; "lower")]
    #[test_case("TREX", "MY-APP"; "upper")]
    #[test_case("Trex", "MyApp"; "title")]
    #[test_case("RH-Trex", "MyApp"; "markers discarded")]
    #[test_case("tReX", "my-app"; "mixed falls back to literal")]
    #[test]
    fn preserve_replacement(input: &str, expect: &str) {
        let matcher = TokenMatcher::new(CasePolicy::Preserve);
        pretty_assertions::assert_eq!(matcher.replace(input, "my-app"), expect);
    }

    #[test]
    fn replacement_is_inserted_literally() {
        assert_eq!(match_and_replace("x trex y", "$ident${1}"), "x $ident${1} y");
    }

    #[test]
    fn substitution_is_idempotent() {
        let once = match_and_replace("type TrexHandler struct{} // rh-trex", "widget").into_owned();
        let twice = match_and_replace(&once, "widget");
        assert_eq!(twice, once);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }

    #[test]
    fn substitution_is_exhaustive() {
        let input = "trex Trex TREX rh-trex RH-TREX rhtrex Rh-TrEx trextrex";
        let result = match_and_replace(input, "widget");
        assert!(!TokenMatcher::default().is_match(&result));
        assert_eq!(result, "widget widget widget widget widget widget widget widgetwidget");
    }

    #[test]
    fn byte_replacement_keeps_invalid_utf8() {
        let input = b"\xff\x00trex\xfe\x80";
        let result = TokenMatcher::default().replace_bytes(input, "ab");
        assert_eq!(&result[..], b"\xff\x00ab\xfe\x80");
    }

    #[test]
    fn parse_case_policy() {
        assert_eq!("Literal".parse::<CasePolicy>(), Ok(CasePolicy::Literal));
        assert_eq!("PRESERVE".parse::<CasePolicy>(), Ok(CasePolicy::Preserve));
        assert!("shout".parse::<CasePolicy>().is_err());
    }
}
