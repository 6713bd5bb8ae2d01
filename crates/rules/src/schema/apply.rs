//! Apply rule definitions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vigil_core::{DebugInfo, Scope};

use super::RuleKind;
use crate::apply::{ApplyRule, DefinitionError};
use crate::expr::Expr;

/// Loop declaration of an apply rule: `for (key => value in source)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForClause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Expr>,
}

/// An `Apply` document.
///
/// ```yaml
/// kind: Apply
/// type: Dependency
/// name: uplink
/// to: Host
/// assign:
///   - match: [{ lit: "web*" }, { var: host.name }]
/// body:
///   - set: { field: parent_host_name, value: { lit: router } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyDef {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub name: String,
    /// Candidate type; defaults to the kind's implicit target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assign: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<Expr>,
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_clause: Option<ForClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<Expr>,
}

fn any_of(mut exprs: Vec<Expr>) -> Option<Expr> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(Expr::Or(exprs)),
    }
}

impl ApplyDef {
    pub fn target_type(&self) -> String {
        self.to
            .clone()
            .unwrap_or_else(|| self.kind.implicit_target().to_string())
    }

    /// `filter && (assign...) && !(ignore...)`, dropping absent parts.
    pub fn effective_filter(&self) -> Option<Expr> {
        let mut parts = Vec::new();
        parts.extend(self.filter.clone());
        parts.extend(any_of(self.assign.clone()));
        parts.extend(any_of(self.ignore.clone()).map(Expr::negate));

        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Expr::And(parts)),
        }
    }

    /// Build the rule, closing over `closure` and attributed to `origin`.
    pub fn to_rule(&self, closure: Arc<Scope>, origin: DebugInfo) -> Result<ApplyRule, DefinitionError> {
        let mut builder = ApplyRule::builder(self.target_type(), self.name.clone())
            .body(self.body.clone())
            .closure(closure)
            .origin(origin);

        if let Some(filter) = self.effective_filter() {
            builder = builder.filter(filter);
        }
        if let Some(clause) = &self.for_clause {
            builder = builder.iteration(clause.key.clone(), clause.value.clone(), clause.source.clone());
        }
        builder.build()
    }
}
