//! Apply passes: every candidate against every rule of a kind, in parallel.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, info_span, warn};
use vigil_core::ConfigObject;

use super::error::{ApplyError, EngineError};
use super::evaluator::{evaluate_apply_rule, RuleApplication};
use super::registry::ApplyRuleRegistry;
use super::rule::ApplyRule;
use crate::schema::RuleKind;
use crate::store::ObjectStore;

/// Aggregated outcome of one or more apply passes.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Candidates evaluated.
    pub candidates: usize,
    /// (candidate, rule) pairs evaluated.
    pub evaluations: usize,
    /// (candidate, rule) pairs that produced at least one object.
    pub matched: usize,
    /// Objects committed.
    pub created: usize,
    /// Reported errors, in candidate order.
    pub errors: Vec<ApplyError>,
}

impl PassReport {
    pub fn merge(&mut self, other: PassReport) {
        self.candidates += other.candidates;
        self.evaluations += other.evaluations;
        self.matched += other.matched;
        self.created += other.created;
        self.errors.extend(other.errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn record(&mut self, result: Result<RuleApplication, ApplyError>) {
        self.evaluations += 1;
        match result {
            Ok(application) => {
                if application.matched {
                    self.matched += 1;
                }
                self.created += application.created.len();
                self.errors.extend(application.errors);
            }
            Err(e) => self.errors.push(e),
        }
    }
}

/// Drives apply passes over an [`ObjectStore`].
///
/// Candidates are independent: each worker evaluates one candidate against
/// all rules of the kind. Shared state is limited to the rule match counters
/// (atomic, bumped through [`ApplyRuleRegistry::increment_match`]) and the
/// store's atomic check-and-commit.
pub struct ApplyEngine<S: ObjectStore> {
    rules: Arc<ApplyRuleRegistry>,
    store: Arc<S>,
    pool: rayon::ThreadPool,
}

impl<S: ObjectStore> ApplyEngine<S> {
    pub fn new(rules: Arc<ApplyRuleRegistry>, store: Arc<S>, worker_threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|i| format!("apply-worker-{i}"))
            .build()?;
        Ok(Self { rules, store, pool })
    }

    pub fn rules(&self) -> &ApplyRuleRegistry {
        &self.rules
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Evaluate every rule of `kind` that targets the candidate's type.
    pub fn evaluate_candidate(&self, kind: RuleKind, candidate: &ConfigObject) -> PassReport {
        let rules = self.rules.rules_for(kind);
        self.evaluate_with(kind, candidate, &rules)
    }

    fn evaluate_with(&self, kind: RuleKind, candidate: &ConfigObject, rules: &[Arc<ApplyRule>]) -> PassReport {
        let mut report = PassReport {
            candidates: 1,
            ..PassReport::default()
        };
        for rule in rules.iter().filter(|r| r.target_type() == candidate.type_name) {
            report.record(evaluate_apply_rule(kind, candidate, rule, &self.rules, self.store.as_ref()));
        }
        report
    }

    /// One full pass for `kind` over a snapshot of the current candidates.
    pub fn run_kind(&self, kind: RuleKind) -> PassReport {
        let rules = self.rules.rules_for(kind);
        if rules.is_empty() {
            return PassReport::default();
        }

        let _span = info_span!("apply_pass", kind = %kind).entered();
        let start = Instant::now();

        let mut target_types: Vec<&str> = Vec::new();
        for rule in &rules {
            if !target_types.contains(&rule.target_type()) {
                target_types.push(rule.target_type());
            }
        }
        let candidates: Vec<Arc<ConfigObject>> = target_types
            .iter()
            .flat_map(|t| self.store.objects_of_type(t))
            .collect();

        let partials: Vec<PassReport> = self.pool.install(|| {
            candidates
                .par_iter()
                .map(|candidate| self.evaluate_with(kind, candidate, &rules))
                .collect()
        });

        let mut report = PassReport::default();
        for partial in partials {
            report.merge(partial);
        }

        for e in &report.errors {
            warn!(kind = %kind, error = %e, "apply rule error");
        }
        info!(
            kind = %kind,
            rules = rules.len(),
            candidates = report.candidates,
            created = report.created,
            errors = report.errors.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "apply pass complete"
        );
        report
    }

    /// Run every kind in evaluation order.
    pub fn run_all(&self) -> PassReport {
        let mut report = PassReport::default();
        for kind in RuleKind::evaluation_order() {
            report.merge(self.run_kind(*kind));
        }
        report
    }
}
