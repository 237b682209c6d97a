//! Rule matching: which effects fire for an intent.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::intent::Intent;
use crate::ruleset::{Effect, Rule};

/// Evaluate rules in declaration order and return the ordered, de-duplicated
/// union of effects fired by matching rules.
///
/// A rule fires when every one of its conditions holds. Fired effects are
/// unique by `(action, arguments)`: the first occurrence keeps its position
/// and later textual duplicates are dropped, so two rules firing the same
/// effect apply it once. The caller validates the intent before this runs.
pub fn fired_effects(rules: &[Rule], intent: &Intent) -> Result<Vec<Effect>> {
    let mut fired: Vec<Effect> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for rule in rules {
        let mut matched = true;
        for condition in &rule.when {
            if !condition
                .trigger
                .evaluate(intent, condition.value.as_deref())?
            {
                matched = false;
                break;
            }
        }
        if !matched {
            continue;
        }
        for effect in &rule.then {
            if seen.insert(effect.identity()) {
                fired.push(effect.clone());
            }
        }
    }

    debug!(uri = %intent.uri, fired = fired.len(), "resolved fired effects");
    Ok(fired)
}
