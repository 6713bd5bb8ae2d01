//! Apply-rule evaluation and object synthesis.
//!
//! - [`ApplyRuleRegistry`] holds compiled rules per [`RuleKind`](crate::schema::RuleKind)
//! - [`evaluate_apply_rule`] decides whether and how often a rule fires for a candidate
//! - the synthesizer builds each derived object and commits it to an
//!   [`ObjectStore`](crate::store::ObjectStore)
//! - [`ApplyEngine`] runs whole passes in parallel

mod engine;
mod error;
mod evaluator;
mod registry;
mod rule;
mod synthesizer;


pub use self::engine::{ApplyEngine, PassReport};
pub use self::error::{ApplyError, DefinitionError, EngineError};
pub use self::evaluator::{evaluate_apply_rule, IterationSource, RuleApplication};
pub use self::registry::ApplyRuleRegistry;
pub use self::rule::{ApplyRule, ApplyRuleBuilder, FilterOutcome};
pub use self::synthesizer::{Binding, ObjectDescriptor, Target};
