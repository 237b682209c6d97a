//! Trigger catalog: named boolean predicates over an intent.
//!
//! The catalog is closed. Trigger names are enforced by serde enum renames,
//! so a rule-set document naming an unknown trigger fails at parse time and a
//! runtime lookup miss is unreachable.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::intent::Intent;

/// A named boolean predicate evaluated against an intent.
///
/// "Not" variants are independent logical negations of their counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    #[serde(rename = "uri starts with")]
    UriStartsWith,
    #[serde(rename = "uri does not start with")]
    UriNotStartsWith,
    #[serde(rename = "uri ends with")]
    UriEndsWith,
    #[serde(rename = "uri does not end with")]
    UriNotEndsWith,
    #[serde(rename = "uri contains")]
    UriContains,
    #[serde(rename = "uri does not contain")]
    UriNotContains,
    #[serde(rename = "uri regex")]
    UriRegex,
    #[serde(rename = "not uri regex")]
    UriNotRegex,
    #[serde(rename = "uri has params")]
    UriHasParams,
    #[serde(rename = "uri does not have params")]
    UriHasNoParams,
    #[serde(rename = "uri is localhost")]
    UriIsLocalhost,
    #[serde(rename = "uri is not localhost")]
    UriIsNotLocalhost,
    #[serde(rename = "uri is secure")]
    UriIsSecure,
    #[serde(rename = "uri is not secure")]
    UriIsNotSecure,
    #[serde(rename = "has tag")]
    HasTag,
    #[serde(rename = "does not have tag")]
    NotHasTag,
}

impl Trigger {
    /// Every trigger in the catalog, in a stable order.
    pub const ALL: &'static [Trigger] = &[
        Trigger::UriStartsWith,
        Trigger::UriNotStartsWith,
        Trigger::UriEndsWith,
        Trigger::UriNotEndsWith,
        Trigger::UriContains,
        Trigger::UriNotContains,
        Trigger::UriRegex,
        Trigger::UriNotRegex,
        Trigger::UriHasParams,
        Trigger::UriHasNoParams,
        Trigger::UriIsLocalhost,
        Trigger::UriIsNotLocalhost,
        Trigger::UriIsSecure,
        Trigger::UriIsNotSecure,
        Trigger::HasTag,
        Trigger::NotHasTag,
    ];

    /// Wire name of the trigger.
    pub fn name(&self) -> &'static str {
        match self {
            Trigger::UriStartsWith => "uri starts with",
            Trigger::UriNotStartsWith => "uri does not start with",
            Trigger::UriEndsWith => "uri ends with",
            Trigger::UriNotEndsWith => "uri does not end with",
            Trigger::UriContains => "uri contains",
            Trigger::UriNotContains => "uri does not contain",
            Trigger::UriRegex => "uri regex",
            Trigger::UriNotRegex => "not uri regex",
            Trigger::UriHasParams => "uri has params",
            Trigger::UriHasNoParams => "uri does not have params",
            Trigger::UriIsLocalhost => "uri is localhost",
            Trigger::UriIsNotLocalhost => "uri is not localhost",
            Trigger::UriIsSecure => "uri is secure",
            Trigger::UriIsNotSecure => "uri is not secure",
            Trigger::HasTag => "has tag",
            Trigger::NotHasTag => "does not have tag",
        }
    }

    /// Whether the trigger takes a comparison value. Checked by rule-set
    /// validation so evaluation never sees a missing value.
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Trigger::UriHasParams
                | Trigger::UriHasNoParams
                | Trigger::UriIsLocalhost
                | Trigger::UriIsNotLocalhost
                | Trigger::UriIsSecure
                | Trigger::UriIsNotSecure
        )
    }

    /// Evaluate the predicate against an intent.
    ///
    /// Regex patterns compile per evaluation; a compile failure surfaces as
    /// [`Error::Regex`].
    pub fn evaluate(&self, intent: &Intent, value: Option<&str>) -> Result<bool> {
        let term = value.unwrap_or_default();
        let uri = intent.uri.as_str();
        let matched = match self {
            Trigger::UriStartsWith => uri.starts_with(term),
            Trigger::UriNotStartsWith => !uri.starts_with(term),
            Trigger::UriEndsWith => uri.ends_with(term),
            Trigger::UriNotEndsWith => !uri.ends_with(term),
            Trigger::UriContains => uri.contains(term),
            Trigger::UriNotContains => !uri.contains(term),
            Trigger::UriRegex => compile(term)?.is_match(uri),
            Trigger::UriNotRegex => !compile(term)?.is_match(uri),
            Trigger::UriHasParams => uri.contains('?'),
            Trigger::UriHasNoParams => !uri.contains('?'),
            Trigger::UriIsLocalhost => uri.starts_with("localhost"),
            Trigger::UriIsNotLocalhost => !uri.starts_with("localhost"),
            Trigger::UriIsSecure => uri.starts_with("https://"),
            Trigger::UriIsNotSecure => !uri.starts_with("https://"),
            Trigger::HasTag => intent.has_tag(term),
            Trigger::NotHasTag => !intent.has_tag(term),
        };
        Ok(matched)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Regex {
        pattern: pattern.to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(uri: &str) -> Intent {
        Intent::new(uri)
    }

    #[test]
    fn test_starts_with_and_negation() {
        let quest = intent("gist:12345");
        assert!(Trigger::UriStartsWith
            .evaluate(&quest, Some("gist:"))
            .unwrap());
        assert!(!Trigger::UriNotStartsWith
            .evaluate(&quest, Some("gist:"))
            .unwrap());
    }

    #[test]
    fn test_ends_with_and_contains() {
        let quest = intent("http://example.com/items.json");
        assert!(Trigger::UriEndsWith.evaluate(&quest, Some(".json")).unwrap());
        assert!(Trigger::UriContains
            .evaluate(&quest, Some("example"))
            .unwrap());
        assert!(Trigger::UriNotContains
            .evaluate(&quest, Some("staging"))
            .unwrap());
    }

    #[test]
    fn test_regex_match() {
        let quest = intent("http://example.com/v2/items");
        assert!(Trigger::UriRegex
            .evaluate(&quest, Some(r"/v\d+/"))
            .unwrap());
        assert!(!Trigger::UriNotRegex
            .evaluate(&quest, Some(r"/v\d+/"))
            .unwrap());
    }

    #[test]
    fn test_regex_compile_failure() {
        let quest = intent("http://example.com");
        let err = Trigger::UriRegex
            .evaluate(&quest, Some("(unclosed"))
            .unwrap_err();
        assert!(matches!(err, Error::Regex { .. }));
    }

    #[test]
    fn test_has_params() {
        assert!(Trigger::UriHasParams
            .evaluate(&intent("http://e.com?a=1"), None)
            .unwrap());
        assert!(Trigger::UriHasNoParams
            .evaluate(&intent("http://e.com"), None)
            .unwrap());
    }

    #[test]
    fn test_localhost_and_secure() {
        assert!(Trigger::UriIsLocalhost
            .evaluate(&intent("localhost:8080/x"), None)
            .unwrap());
        assert!(Trigger::UriIsNotLocalhost
            .evaluate(&intent("http://e.com"), None)
            .unwrap());
        assert!(Trigger::UriIsSecure
            .evaluate(&intent("https://e.com"), None)
            .unwrap());
        assert!(Trigger::UriIsNotSecure
            .evaluate(&intent("http://e.com"), None)
            .unwrap());
    }

    #[test]
    fn test_tag_membership() {
        let quest = Intent::new("http://e.com").with_tag("internal");
        assert!(Trigger::HasTag.evaluate(&quest, Some("internal")).unwrap());
        assert!(!Trigger::HasTag.evaluate(&quest, Some("public")).unwrap());
        assert!(Trigger::NotHasTag.evaluate(&quest, Some("public")).unwrap());
    }

    #[test]
    fn test_unknown_name_fails_at_parse() {
        let parsed: std::result::Result<Trigger, _> =
            serde_json::from_str(r#""uri starts with""#);
        assert_eq!(parsed.unwrap(), Trigger::UriStartsWith);

        let unknown: std::result::Result<Trigger, _> =
            serde_json::from_str(r#""uri shouts at""#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<_> = Trigger::ALL.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Trigger::ALL.len());
    }
}
