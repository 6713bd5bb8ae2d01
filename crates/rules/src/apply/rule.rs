//! Compiled apply rules.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vigil_core::{DebugInfo, Scope, ScriptError};

use super::error::DefinitionError;
use crate::expr::{Expr, Frame};

/// Outcome of evaluating a rule's filter.
///
/// Failures are kept distinct from `Matched(false)` so the caller decides,
/// visibly, what an erroring filter means.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Matched(bool),
    EvaluationFailed(ScriptError),
}

/// An apply rule, immutable once registered except for its match counter.
#[derive(Debug)]
pub struct ApplyRule {
    target_type: String,
    name: String,
    filter: Option<Expr>,
    iteration_source: Option<Expr>,
    key_var: Option<String>,
    value_var: Option<String>,
    body: Vec<Expr>,
    closure_scope: Arc<Scope>,
    origin: DebugInfo,
    matches: AtomicUsize,
}

impl ApplyRule {
    pub fn builder(target_type: impl Into<String>, name: impl Into<String>) -> ApplyRuleBuilder {
        ApplyRuleBuilder {
            target_type: target_type.into(),
            name: name.into(),
            filter: None,
            iteration: None,
            body: Vec::new(),
            closure_scope: None,
            origin: DebugInfo::default(),
        }
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filter(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn iteration_source(&self) -> Option<&Expr> {
        self.iteration_source.as_ref()
    }

    pub fn key_var(&self) -> Option<&str> {
        self.key_var.as_deref()
    }

    pub fn value_var(&self) -> Option<&str> {
        self.value_var.as_deref()
    }

    pub fn body(&self) -> &[Expr] {
        &self.body
    }

    pub fn closure_scope(&self) -> &Scope {
        &self.closure_scope
    }

    pub fn origin(&self) -> &DebugInfo {
        &self.origin
    }

    /// Evaluate the filter in `locals`. An absent filter always matches.
    pub fn check_filter(&self, locals: &Scope) -> FilterOutcome {
        let Some(filter) = &self.filter else {
            return FilterOutcome::Matched(true);
        };
        match filter.evaluate(&mut Frame::new(locals)) {
            Ok(value) => FilterOutcome::Matched(value.is_truthy()),
            Err(e) => FilterOutcome::EvaluationFailed(e.at(&self.origin)),
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.load(Ordering::Relaxed)
    }

    pub(crate) fn add_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }
}

/// Builder for [`ApplyRule`]; validates loop-variable declarations.
#[derive(Debug, Clone)]
pub struct ApplyRuleBuilder {
    target_type: String,
    name: String,
    filter: Option<Expr>,
    iteration: Option<(Option<String>, Option<String>, Option<Expr>)>,
    body: Vec<Expr>,
    closure_scope: Option<Arc<Scope>>,
    origin: DebugInfo,
}

impl ApplyRuleBuilder {
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Iterate over `source`, binding each element (or key) to `key_var`.
    pub fn for_each(mut self, key_var: impl Into<String>, source: Expr) -> Self {
        self.iteration = Some((Some(key_var.into()), None, Some(source)));
        self
    }

    /// Iterate over a mapping-valued `source`, binding keys and values.
    pub fn for_each_pair(
        mut self,
        key_var: impl Into<String>,
        value_var: impl Into<String>,
        source: Expr,
    ) -> Self {
        self.iteration = Some((Some(key_var.into()), Some(value_var.into()), Some(source)));
        self
    }

    /// Raw loop declaration as it appears in a definition; checked by [`build`](Self::build).
    pub fn iteration(
        mut self,
        key_var: Option<String>,
        value_var: Option<String>,
        source: Option<Expr>,
    ) -> Self {
        self.iteration = Some((key_var, value_var, source));
        self
    }

    pub fn body(mut self, body: Vec<Expr>) -> Self {
        self.body = body;
        self
    }

    pub fn statement(mut self, expr: Expr) -> Self {
        self.body.push(expr);
        self
    }

    /// Capture the definition-time scope. The snapshot is shared, never mutated.
    pub fn closure(mut self, scope: Arc<Scope>) -> Self {
        self.closure_scope = Some(scope);
        self
    }

    pub fn origin(mut self, origin: DebugInfo) -> Self {
        self.origin = origin;
        self
    }

    pub fn build(self) -> Result<ApplyRule, DefinitionError> {
        let (key_var, value_var, iteration_source) = self.iteration.unwrap_or((None, None, None));

        if iteration_source.is_none() && (key_var.is_some() || value_var.is_some()) {
            return Err(DefinitionError::LoopVarsWithoutSource {
                rule: self.name,
                origin: self.origin,
            });
        }
        if value_var.is_some() && key_var.is_none() {
            return Err(DefinitionError::ValueWithoutKey {
                rule: self.name,
                origin: self.origin,
            });
        }

        Ok(ApplyRule {
            target_type: self.target_type,
            name: self.name,
            filter: self.filter,
            iteration_source,
            key_var,
            value_var,
            body: self.body,
            closure_scope: self.closure_scope.unwrap_or_default(),
            origin: self.origin,
            matches: AtomicUsize::new(0),
        })
    }
}
