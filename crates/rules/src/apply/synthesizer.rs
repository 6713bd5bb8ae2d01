//! Builds and commits one object per successful rule application.

use std::sync::Arc;

use tracing::debug;
use vigil_core::{ConfigObject, DebugInfo, Dictionary, Scope, ScriptError, Value};

use super::error::ApplyError;
use super::rule::ApplyRule;
use crate::expr::{Expr, Frame};
use crate::schema::RuleKind;
use crate::store::ObjectStore;

/// The host/service pair a rule is applied to. `service` is set for
/// service candidates only.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub host: &'a ConfigObject,
    pub service: Option<&'a ConfigObject>,
}

impl<'a> Target<'a> {
    pub fn candidate(&self) -> &'a ConfigObject {
        self.service.unwrap_or(self.host)
    }

    pub fn host_name(&self) -> &'a str {
        self.host.short_name()
    }

    pub fn service_name(&self) -> Option<&'a str> {
        self.service.map(ConfigObject::short_name)
    }
}

/// Loop variable binding for one iteration: `(variable name, value)`.
pub type Binding<'a> = Option<(&'a str, Value)>;

/// Transient build record for one synthesized object.
///
/// Assignments run first in the order they were composed, then the rule body,
/// so user-authored fields override the implicit ones.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor<'a> {
    pub type_name: String,
    pub name: String,
    pub identity: String,
    pub assignments: Vec<Expr>,
    pub body: &'a [Expr],
    pub origin: &'a DebugInfo,
}

impl<'a> ObjectDescriptor<'a> {
    /// Compose the descriptor for `rule` applied to `target` under `name`.
    pub fn compose(
        kind: RuleKind,
        target: &Target<'_>,
        rule: &'a ApplyRule,
        name: &str,
        key: &Binding<'_>,
        value: &Binding<'_>,
    ) -> Self {
        let mut assignments: Vec<Expr> = kind
            .linkage_fields(target.host_name(), target.service_name())
            .into_iter()
            .map(|(field, v)| Expr::set(field, Expr::lit(v)))
            .collect();

        let zone = target.candidate().zone();
        if !zone.is_empty() {
            assignments.push(Expr::set("zone", Expr::lit(zone)));
        }
        if let Some((var, v)) = key {
            assignments.push(Expr::set(*var, Expr::Lit(v.clone())));
        }
        if let Some((var, v)) = value {
            assignments.push(Expr::set(*var, Expr::Lit(v.clone())));
        }

        Self {
            type_name: kind.to_string(),
            name: name.to_string(),
            identity: kind.compose_name(target.host_name(), target.service_name(), name),
            assignments,
            body: rule.body(),
            origin: rule.origin(),
        }
    }

    /// Run the assignments and the body against `locals`, producing the object.
    pub fn compile(&self, locals: &Scope) -> Result<ConfigObject, ScriptError> {
        let mut attrs = Dictionary::new();
        attrs.insert("name".to_string(), Value::from(self.name.as_str()));

        {
            let mut frame = Frame::with_this(locals, &mut attrs);
            for expr in self.assignments.iter().chain(self.body) {
                expr.evaluate(&mut frame).map_err(|e| e.at(self.origin))?;
            }
        }

        // The short name is part of the identity and cannot be reassigned.
        attrs.insert("name".to_string(), Value::from(self.name.as_str()));

        Ok(ConfigObject {
            type_name: self.type_name.clone(),
            name: self.identity.clone(),
            attrs,
            origin: Some(self.origin.clone()),
        })
    }
}

/// Build one object and commit it to `store`.
///
/// A collision or body failure aborts only this synthesis.
#[allow(clippy::too_many_arguments)]
pub(crate) fn synthesize<S: ObjectStore + ?Sized>(
    kind: RuleKind,
    target: &Target<'_>,
    rule: &ApplyRule,
    name: &str,
    locals: &Scope,
    key: &Binding<'_>,
    value: &Binding<'_>,
    store: &S,
) -> Result<Arc<ConfigObject>, ApplyError> {
    debug!(
        "Applying {} '{}' to object '{}' for rule {}",
        kind.to_string().to_lowercase(),
        name,
        target.candidate().name,
        rule.origin()
    );

    let descriptor = ObjectDescriptor::compose(kind, target, rule, name, key, value);
    let object = descriptor.compile(locals).map_err(|source| ApplyError::Body {
        name: descriptor.identity.clone(),
        source,
    })?;

    store.commit(object).map_err(|source| ApplyError::Collision {
        source,
        origin: rule.origin().clone(),
    })
}
