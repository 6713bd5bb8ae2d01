//! Registry of apply rules per rule kind.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::error::DefinitionError;
use super::rule::ApplyRule;
use crate::schema::RuleKind;

/// Apply rules grouped by kind, in registration order.
///
/// Read-mostly once loading finishes. The only mutation during apply passes
/// is [`increment_match`](Self::increment_match), called by
/// [`evaluate_apply_rule`](super::evaluate_apply_rule) once per matched
/// candidate and atomic per rule.
#[derive(Debug, Default)]
pub struct ApplyRuleRegistry {
    targets: RwLock<HashMap<RuleKind, Vec<String>>>,
    rules: RwLock<HashMap<RuleKind, Vec<Arc<ApplyRule>>>>,
}

impl ApplyRuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every [`RuleKind`] registered for its default targets.
    pub fn with_default_targets() -> Self {
        let registry = Self::new();
        for kind in RuleKind::ALL {
            registry.register_target_types(kind, kind.default_targets());
        }
        registry
    }

    /// Declare which candidate types rules of `kind` may target.
    pub fn register_target_types(&self, kind: RuleKind, types: &[&str]) {
        let mut targets = self.targets.write().expect("apply targets lock poisoned");
        let entry = targets.entry(kind).or_default();
        for t in types {
            if !entry.iter().any(|existing| existing.as_str() == *t) {
                entry.push(t.to_string());
            }
        }
    }

    pub fn is_valid_target(&self, kind: RuleKind, target_type: &str) -> bool {
        self.targets
            .read()
            .expect("apply targets lock poisoned")
            .get(&kind)
            .is_some_and(|types| types.iter().any(|t| t == target_type))
    }

    /// Register a rule. Duplicate names are allowed; each rule is evaluated on its own.
    pub fn add_rule(&self, kind: RuleKind, rule: ApplyRule) -> Result<Arc<ApplyRule>, DefinitionError> {
        if !self.is_valid_target(kind, rule.target_type()) {
            return Err(DefinitionError::InvalidTarget {
                kind,
                rule: rule.name().to_string(),
                target: rule.target_type().to_string(),
                origin: rule.origin().clone(),
            });
        }

        let rule = Arc::new(rule);
        self.rules
            .write()
            .expect("apply rules lock poisoned")
            .entry(kind)
            .or_default()
            .push(Arc::clone(&rule));
        Ok(rule)
    }

    /// Snapshot of the rules of `kind` in registration order.
    pub fn rules_for(&self, kind: RuleKind) -> Vec<Arc<ApplyRule>> {
        self.rules
            .read()
            .expect("apply rules lock poisoned")
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn increment_match(&self, rule: &ApplyRule) {
        rule.add_match();
    }

    pub fn rule_count(&self) -> usize {
        self.rules
            .read()
            .expect("apply rules lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Rules whose match counter is still zero, ordered by kind then registration.
    pub fn unmatched_rules(&self) -> Vec<(RuleKind, Arc<ApplyRule>)> {
        let rules = self.rules.read().expect("apply rules lock poisoned");
        let mut kinds: Vec<&RuleKind> = rules.keys().collect();
        kinds.sort();
        kinds
            .into_iter()
            .flat_map(|kind| {
                rules[kind]
                    .iter()
                    .filter(|r| r.match_count() == 0)
                    .map(move |r| (*kind, Arc::clone(r)))
            })
            .collect()
    }

    /// Log a warning for every rule that matched nothing. Returns how many were found.
    pub fn warn_unmatched(&self) -> usize {
        let unmatched = self.unmatched_rules();
        for (kind, rule) in &unmatched {
            warn!(
                "Apply rule '{}' ({}) for type '{}' does not match anywhere!",
                rule.name(),
                rule.origin(),
                kind
            );
        }
        unmatched.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(target: &str, name: &str) -> ApplyRule {
        ApplyRule::builder(target, name).build().unwrap()
    }

    #[test]
    fn rejects_unregistered_target() {
        let registry = ApplyRuleRegistry::with_default_targets();
        let err = registry
            .add_rule(RuleKind::Service, rule("Service", "nested"))
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidTarget { .. }));
        assert!(err.to_string().contains("Can't apply Service 'nested' to object type 'Service'"));
        assert_eq!(registry.rule_count(), 0);
    }

    #[test]
    fn keeps_registration_order_and_duplicates() {
        let registry = ApplyRuleRegistry::with_default_targets();
        registry.add_rule(RuleKind::Dependency, rule("Host", "b")).unwrap();
        registry.add_rule(RuleKind::Dependency, rule("Service", "a")).unwrap();
        registry.add_rule(RuleKind::Dependency, rule("Host", "b")).unwrap();

        let names: Vec<String> = registry
            .rules_for(RuleKind::Dependency)
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a", "b"]);
        assert!(registry.rules_for(RuleKind::Notification).is_empty());
    }

    #[test]
    fn unmatched_rules_track_counters() {
        let registry = ApplyRuleRegistry::with_default_targets();
        let hit = registry.add_rule(RuleKind::Notification, rule("Host", "hit")).unwrap();
        registry.add_rule(RuleKind::Notification, rule("Host", "miss")).unwrap();

        registry.increment_match(&hit);
        registry.increment_match(&hit);
        assert_eq!(hit.match_count(), 2);

        let unmatched = registry.unmatched_rules();
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].1.name(), "miss");
        assert_eq!(registry.warn_unmatched(), 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let registry = Arc::new(ApplyRuleRegistry::with_default_targets());
        let shared = registry.add_rule(RuleKind::Dependency, rule("Host", "r")).unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        registry.increment_match(&shared);
                    }
                });
            }
        });

        assert_eq!(shared.match_count(), 1000);
    }
}
