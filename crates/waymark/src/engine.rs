//! Engine facade: one validated rule set bound to the build pipeline.

use std::path::Path;

use tracing::debug;

use crate::action::Action;
use crate::builder::DescriptorBuilder;
use crate::credentials::FileCache;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::intent::Intent;
use crate::matcher;
use crate::ruleset::{Effect, RuleSet};
use crate::trigger::Trigger;

/// Translates intents into wire-ready descriptors under one rule set.
///
/// Construction eagerly validates the rule set; an invalid shape is fatal and
/// no engine is produced. The engine owns the credential file cache, the only
/// state shared across build calls.
///
/// ```
/// use waymark::{Engine, Intent};
///
/// # fn example() -> waymark::Result<()> {
/// let engine = Engine::from_json(r#"{
///     "rules": [{
///         "when": [{"trigger": "uri starts with", "value": "gist:"}],
///         "then": [{"action": "replace start", "values": ["gist:", "http://gist"]}]
///     }]
/// }"#)?;
///
/// let descriptor = engine.build("gist:12345")?;
/// assert_eq!(descriptor.uri, "http://gist12345");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Engine {
    rules: RuleSet,
    files: FileCache,
}

impl Engine {
    /// Bind a rule set. Fails fast on an invalid shape.
    pub fn new(rules: RuleSet) -> Result<Self> {
        rules.validate()?;
        debug!(rules = rules.rules.len(), "rule set validated");
        Ok(Self {
            rules,
            files: FileCache::new(),
        })
    }

    /// Construct from a JSON rule-set document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(RuleSet::from_json(json)?)
    }

    /// Construct from a TOML rule-set document.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Self::new(RuleSet::from_toml(toml_str)?)
    }

    /// Construct from a rule-set file (JSON or TOML by extension).
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(RuleSet::from_file(path)?)
    }

    /// Read-only view of the bound rule set.
    pub fn rule_set(&self) -> &RuleSet {
        &self.rules
    }

    /// Wire names of every trigger in the catalog.
    pub fn trigger_names() -> Vec<&'static str> {
        Trigger::ALL.iter().map(|t| t.name()).collect()
    }

    /// Wire names of every action in the catalog.
    pub fn action_names() -> Vec<&'static str> {
        Action::ALL.iter().map(|a| a.name()).collect()
    }

    /// The engine-lifetime credential file cache.
    pub fn file_cache(&self) -> &FileCache {
        &self.files
    }

    /// Which effects would fire for this intent, in application order.
    ///
    /// Validates the intent first; an invalid intent aborts before any rule
    /// evaluates.
    pub fn fired_effects(&self, intent: &Intent) -> Result<Vec<Effect>> {
        intent.validate()?;
        matcher::fired_effects(&self.rules.rules, intent)
    }

    /// Build a validated, normalized descriptor for an intent.
    ///
    /// Accepts a structured [`Intent`] or anything convertible into one (a
    /// bare URI string builds `{uri}`).
    pub fn build(&self, intent: impl Into<Intent>) -> Result<Descriptor> {
        let intent = intent.into();
        intent.validate()?;

        let effects = matcher::fired_effects(&self.rules.rules, &intent)?;
        let mut builder = DescriptorBuilder::seed(&intent);
        for effect in &effects {
            effect.action.apply(&mut builder, &effect.values)?;
        }
        builder.default_method();
        builder.validate()?;

        let descriptor = builder.normalize(&self.files)?;
        debug!(
            uri = %descriptor.uri,
            method = %descriptor.method,
            effects = effects.len(),
            "descriptor built"
        );
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::intent::Method;

    const GIST_RULES: &str = r#"{
        "rules": [{
            "when": [{"trigger": "uri starts with", "value": "gist:"}],
            "then": [{"action": "replace start", "values": ["gist:", "http://gist"]}]
        }]
    }"#;

    #[test]
    fn test_invalid_rule_set_is_fatal_at_construction() {
        let err = Engine::from_json(r#"{"rules": [{"when": [], "then": []}]}"#).unwrap_err();
        assert!(matches!(err, Error::RuleSet(_)));
    }

    #[test]
    fn test_gist_rewrite_example() {
        let engine = Engine::from_json(GIST_RULES).unwrap();
        let descriptor = engine.build("gist:123").unwrap();
        assert_eq!(descriptor.uri, "http://gist123");
        assert_eq!(descriptor.method, Method::Get);
    }

    #[test]
    fn test_invalid_intent_rejected_before_matching() {
        // The regex would fail if it ever evaluated; the short uri must lose
        // first.
        let engine = Engine::from_json(
            r#"{
            "rules": [{
                "when": [{"trigger": "uri regex", "value": "(broken"}],
                "then": [{"action": "set proxy", "values": ["p"]}]
            }]
        }"#,
        )
        .unwrap();
        let err = engine.build("abc").unwrap_err();
        assert!(matches!(err, Error::Intent(_)));
    }

    #[test]
    fn test_introspection() {
        let engine = Engine::from_json(GIST_RULES).unwrap();
        assert_eq!(engine.rule_set().rules.len(), 1);
        assert!(Engine::trigger_names().contains(&"uri starts with"));
        assert!(Engine::action_names().contains(&"set custom"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let engine = Engine::from_json(GIST_RULES).unwrap();
        let a = engine.build("gist:123").unwrap();
        let b = engine.build("gist:123").unwrap();
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }
}
