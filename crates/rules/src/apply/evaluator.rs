//! Evaluation of one apply rule against one candidate object.
//!
//! Error policy:
//! - filter and iteration-source evaluation failures are swallowed and the
//!   candidate counts as "no match" (see [`evaluate_apply_rule`]);
//! - structural errors are returned as `Err` and abort the rule for this
//!   candidate only;
//! - collisions and body failures are collected per synthesis attempt in
//!   [`RuleApplication::errors`] and never stop the iteration.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug_span;
use vigil_core::{ConfigObject, Scope, Value, HOST_TYPE};

use super::error::ApplyError;
use super::registry::ApplyRuleRegistry;
use super::rule::{ApplyRule, FilterOutcome};
use super::synthesizer::{synthesize, Binding, Target};
use crate::expr::Frame;
use crate::schema::RuleKind;
use crate::store::ObjectStore;

/// What a rule's iteration source evaluated to.
#[derive(Debug, Clone, PartialEq)]
pub enum IterationSource {
    /// No iteration source: one pass with an empty instance.
    Single,
    Sequence(Vec<Value>),
    Mapping(IndexMap<String, Value>),
}

impl IterationSource {
    /// Classify an evaluated source value; anything but an array or a
    /// dictionary is rejected with its type name.
    pub fn from_value(value: Value) -> Result<Self, &'static str> {
        match value {
            Value::Array(items) => Ok(IterationSource::Sequence(items)),
            Value::Dictionary(dict) => Ok(IterationSource::Mapping(dict)),
            other => Err(other.type_name()),
        }
    }
}

/// Result of applying one rule to one candidate.
#[derive(Debug, Default)]
pub struct RuleApplication {
    /// At least one object was synthesized.
    pub matched: bool,
    /// Objects committed by this application, in iteration order.
    pub created: Vec<Arc<ConfigObject>>,
    /// Reported per-synthesis failures (collisions, body errors).
    pub errors: Vec<ApplyError>,
}

impl RuleApplication {
    fn no_match() -> Self {
        Self::default()
    }
}

/// Resolve the host/service pair of a candidate. Services are linked to
/// their host through `host_name`; candidates of any other type cannot be
/// linked at all.
fn resolve_target<'a, S: ObjectStore + ?Sized>(
    candidate: &'a ConfigObject,
    rule: &ApplyRule,
    store: &S,
    host_slot: &'a mut Option<Arc<ConfigObject>>,
) -> Result<Target<'a>, ApplyError> {
    if candidate.is_host() {
        return Ok(Target {
            host: candidate,
            service: None,
        });
    }
    if !candidate.is_service() {
        return Err(ApplyError::UnlinkableCandidate {
            candidate: candidate.name.clone(),
            type_name: candidate.type_name.clone(),
            origin: rule.origin().clone(),
        });
    }

    let host_name = candidate.host_name().unwrap_or_default();
    let host = store
        .get(HOST_TYPE, host_name)
        .ok_or_else(|| ApplyError::UnknownHost {
            candidate: candidate.name.clone(),
            host: host_name.to_string(),
            origin: rule.origin().clone(),
        })?;
    let host: &'a ConfigObject = host_slot.insert(host);

    Ok(Target {
        host,
        service: Some(candidate),
    })
}

/// Apply `rule` of `kind` to `candidate`, committing synthesized objects to
/// `store`.
///
/// Filter and iteration-source evaluation errors are mapped to "no match"
/// right here, without logging, so that one malformed predicate cannot hold
/// up unrelated objects. Structural configuration errors are returned.
///
/// A match is recorded once per call through
/// [`ApplyRuleRegistry::increment_match`], however many objects it produced.
pub fn evaluate_apply_rule<S: ObjectStore + ?Sized>(
    kind: RuleKind,
    candidate: &ConfigObject,
    rule: &ApplyRule,
    rules: &ApplyRuleRegistry,
    store: &S,
) -> Result<RuleApplication, ApplyError> {
    let _span = debug_span!(
        "apply_rule",
        kind = %kind,
        rule = %rule.name(),
        origin = %rule.origin(),
        candidate = %candidate.name
    )
    .entered();

    let mut host_slot = None;
    let target = resolve_target(candidate, rule, store, &mut host_slot)?;

    let mut locals = Scope::new();
    rule.closure_scope().copy_into(&mut locals);
    locals.set("host", target.host.to_value());
    if let Some(service) = target.service {
        locals.set("service", service.to_value());
    }

    match rule.check_filter(&locals) {
        FilterOutcome::Matched(true) => {}
        FilterOutcome::Matched(false) => return Ok(RuleApplication::no_match()),
        // Swallowed: an erroring filter is a non-match.
        FilterOutcome::EvaluationFailed(_) => return Ok(RuleApplication::no_match()),
    }

    let source = match rule.iteration_source() {
        None => IterationSource::Single,
        Some(expr) => match expr.evaluate(&mut Frame::new(&locals)) {
            Ok(value) => IterationSource::from_value(value).map_err(|shape| {
                ApplyError::InvalidIterationSource {
                    rule: rule.name().to_string(),
                    shape,
                    origin: rule.origin().clone(),
                }
            })?,
            // Swallowed: no instances to iterate over.
            Err(_) => return Ok(RuleApplication::no_match()),
        },
    };

    let mut application = RuleApplication::default();

    match source {
        IterationSource::Single => {
            attempt(kind, &target, rule, rule.name(), &locals, None, None, store, &mut application);
        }
        IterationSource::Sequence(items) => {
            if rule.value_var().is_some() {
                return Err(ApplyError::ArrayIteratorWithValue {
                    rule: rule.name().to_string(),
                    origin: rule.origin().clone(),
                });
            }
            for item in items {
                let mut name = rule.name().to_string();
                let key = rule.key_var().map(|var| {
                    locals.set(var, item.clone());
                    name.push_str(&item.to_string());
                    (var, item)
                });
                attempt(kind, &target, rule, &name, &locals, key, None, store, &mut application);
            }
        }
        IterationSource::Mapping(dict) => {
            let (Some(key_var), Some(value_var)) = (rule.key_var(), rule.value_var()) else {
                return Err(ApplyError::DictionaryIteratorWithoutValue {
                    rule: rule.name().to_string(),
                    origin: rule.origin().clone(),
                });
            };
            for (key, value) in dict {
                locals.set(key_var, Value::from(key.as_str()));
                locals.set(value_var, value.clone());
                let name = format!("{}{}", rule.name(), key);
                attempt(
                    kind,
                    &target,
                    rule,
                    &name,
                    &locals,
                    Some((key_var, Value::String(key))),
                    Some((value_var, value)),
                    store,
                    &mut application,
                );
            }
        }
    }

    if application.matched {
        rules.increment_match(rule);
    }

    Ok(application)
}

#[allow(clippy::too_many_arguments)]
fn attempt<S: ObjectStore + ?Sized>(
    kind: RuleKind,
    target: &Target<'_>,
    rule: &ApplyRule,
    name: &str,
    locals: &Scope,
    key: Binding<'_>,
    value: Binding<'_>,
    store: &S,
    application: &mut RuleApplication,
) {
    match synthesize(kind, target, rule, name, locals, &key, &value, store) {
        Ok(object) => {
            application.matched = true;
            application.created.push(object);
        }
        Err(e) => application.errors.push(e),
    }
}
