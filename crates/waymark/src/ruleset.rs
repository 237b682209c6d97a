//! Declarative rule-set documents.
//!
//! Parses JSON or TOML rule sets into [`RuleSet`] structs and validates them.
//! A rule set is immutable once it validates at engine construction.
//!
//! # Example TOML
//!
//! ```toml
//! [[rules]]
//! when = [{ trigger = "uri starts with", value = "gist:" }]
//! then = [{ action = "replace start", values = ["gist:", "http://gist"] }]
//!
//! [[rules]]
//! when = [{ trigger = "uri is not secure" }]
//! then = [{ action = "set strict SSL", values = ["false"] }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{Error, Result};
use crate::trigger::Trigger;

/// One trigger plus its optional comparison value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Condition {
    pub fn new(trigger: Trigger, value: impl Into<String>) -> Self {
        Self {
            trigger,
            value: Some(value.into()),
        }
    }

    pub fn bare(trigger: Trigger) -> Self {
        Self {
            trigger,
            value: None,
        }
    }
}

/// One action plus its literal arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub action: Action,
    pub values: Vec<String>,
}

impl Effect {
    pub fn new<I, S>(action: Action, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            action,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Dedup identity: effects firing from different rules collapse when
    /// action and arguments are textually identical.
    pub(crate) fn identity(&self) -> String {
        format!("{}={}", self.action.name(), self.values.join(","))
    }
}

/// A when/then pair: a conjunction of triggers that, if all true, contributes
/// its effects to the fired set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub when: Vec<Condition>,
    pub then: Vec<Effect>,
}

/// An ordered collection of rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Parse a rule set from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::RuleSet(format!("JSON parse error: {}", e)))
    }

    /// Parse a rule set from a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::RuleSet(format!("TOML parse error: {}", e)))
    }

    /// Load a rule set from a file; `.json` files parse as JSON, everything
    /// else as TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::RuleSet(format!("Failed to read {}: {}", path.display(), e)))?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Validate the rule-set shape.
    ///
    /// Checks, per rule:
    /// - at least one condition and one effect
    /// - conditions carry a value exactly when their trigger requires one
    /// - condition values are 1-5000 characters
    /// - effects carry at least one argument
    pub fn validate(&self) -> Result<()> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.when.is_empty() {
                return Err(Error::RuleSet(format!(
                    "rule {}: 'when' must have at least one condition",
                    idx
                )));
            }
            if rule.then.is_empty() {
                return Err(Error::RuleSet(format!(
                    "rule {}: 'then' must have at least one effect",
                    idx
                )));
            }

            for condition in &rule.when {
                match &condition.value {
                    None if condition.trigger.requires_value() => {
                        return Err(Error::RuleSet(format!(
                            "rule {}: trigger '{}' requires a value",
                            idx,
                            condition.trigger.name()
                        )));
                    }
                    Some(v) => {
                        let len = v.chars().count();
                        if len == 0 || len > 5000 {
                            return Err(Error::RuleSet(format!(
                                "rule {}: trigger '{}' value must be 1-5000 characters",
                                idx,
                                condition.trigger.name()
                            )));
                        }
                    }
                    None => {}
                }
            }

            for effect in &rule.then {
                if effect.values.is_empty() {
                    return Err(Error::RuleSet(format!(
                        "rule {}: action '{}' must have at least one value",
                        idx,
                        effect.action.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIST_JSON: &str = r#"{
        "rules": [{
            "when": [{"trigger": "uri starts with", "value": "gist:"}],
            "then": [{"action": "replace start", "values": ["gist:", "http://gist"]}]
        }]
    }"#;

    #[test]
    fn test_parse_json_rule_set() {
        let rules = RuleSet::from_json(GIST_JSON).unwrap();
        rules.validate().unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(rules.rules[0].when[0].trigger, Trigger::UriStartsWith);
        assert_eq!(rules.rules[0].then[0].action, Action::ReplaceStart);
    }

    #[test]
    fn test_parse_toml_rule_set() {
        let toml_doc = r#"
[[rules]]
when = [{ trigger = "uri is secure" }]
then = [{ action = "set strict SSL", values = ["true"] }]
"#;
        let rules = RuleSet::from_toml(toml_doc).unwrap();
        rules.validate().unwrap();
        assert_eq!(rules.rules[0].when[0].trigger, Trigger::UriIsSecure);
        assert!(rules.rules[0].when[0].value.is_none());
    }

    #[test]
    fn test_unknown_action_name_rejected_at_parse() {
        let bad = r#"{
            "rules": [{
                "when": [{"trigger": "uri starts with", "value": "x"}],
                "then": [{"action": "set warp drive", "values": ["9"]}]
            }]
        }"#;
        let err = RuleSet::from_json(bad).unwrap_err();
        assert!(matches!(err, Error::RuleSet(_)));
    }

    #[test]
    fn test_empty_when_rejected() {
        let rules = RuleSet {
            rules: vec![Rule {
                when: vec![],
                then: vec![Effect::new(Action::SetProxy, ["p"])],
            }],
        };
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("at least one condition"));
    }

    #[test]
    fn test_empty_then_rejected() {
        let rules = RuleSet {
            rules: vec![Rule {
                when: vec![Condition::new(Trigger::UriContains, "x")],
                then: vec![],
            }],
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_missing_trigger_value_rejected() {
        let rules = RuleSet {
            rules: vec![Rule {
                when: vec![Condition::bare(Trigger::UriStartsWith)],
                then: vec![Effect::new(Action::SetProxy, ["p"])],
            }],
        };
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("requires a value"));
    }

    #[test]
    fn test_effect_without_values_rejected() {
        let rules = RuleSet {
            rules: vec![Rule {
                when: vec![Condition::new(Trigger::UriContains, "x")],
                then: vec![Effect {
                    action: Action::SetProxy,
                    values: vec![],
                }],
            }],
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn test_empty_rule_list_is_valid() {
        RuleSet { rules: vec![] }.validate().unwrap();
    }

    #[test]
    fn test_effect_identity() {
        let a = Effect::new(Action::SetHeaderParameter, ["H1", "v1"]);
        let b = Effect::new(Action::SetHeaderParameter, ["H1", "v1"]);
        let c = Effect::new(Action::SetHeaderParameter, ["H2", "v1"]);
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_roundtrip_serialize() {
        let rules = RuleSet::from_json(GIST_JSON).unwrap();
        let serialized = serde_json::to_string(&rules).unwrap();
        let parsed_back = RuleSet::from_json(&serialized).unwrap();
        assert_eq!(rules, parsed_back);
    }
}
