//! Error types for rule definition and apply evaluation.

use vigil_core::{DebugInfo, ScriptError};

use crate::schema::RuleKind;
use crate::store::CommitError;

/// A rule that cannot be built or registered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("Can't apply {kind} '{rule}' to object type '{target}' ({origin})")]
    InvalidTarget {
        kind: RuleKind,
        rule: String,
        target: String,
        origin: DebugInfo,
    },

    #[error("Apply rule '{rule}' declares loop variables without an iteration source ({origin})")]
    LoopVarsWithoutSource { rule: String, origin: DebugInfo },

    #[error("Apply rule '{rule}' declares a value variable without a key variable ({origin})")]
    ValueWithoutKey { rule: String, origin: DebugInfo },
}

/// Reported failure of one rule application.
///
/// Structural errors abort the rule for the current candidate; collisions
/// and body failures abort a single synthesis only. Filter and iteration
/// source evaluation failures never appear here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyError {
    #[error("Array iterator requires a scalar key variable only: apply rule '{rule}' declares a value variable ({origin})")]
    ArrayIteratorWithValue { rule: String, origin: DebugInfo },

    #[error("Dictionary iterator requires a value variable: apply rule '{rule}' declares only a key variable ({origin})")]
    DictionaryIteratorWithoutValue { rule: String, origin: DebugInfo },

    #[error("Apply rule '{rule}' must iterate over an Array or Dictionary, got '{shape}' ({origin})")]
    InvalidIterationSource {
        rule: String,
        shape: &'static str,
        origin: DebugInfo,
    },

    #[error("Service '{candidate}' references unknown host '{host}' ({origin})")]
    UnknownHost {
        candidate: String,
        host: String,
        origin: DebugInfo,
    },

    #[error("Can't link '{candidate}' of type '{type_name}' to a host or service ({origin})")]
    UnlinkableCandidate {
        candidate: String,
        type_name: String,
        origin: DebugInfo,
    },

    #[error("{source} while applying rule ({origin})")]
    Collision {
        #[source]
        source: CommitError,
        origin: DebugInfo,
    },

    #[error("Failed to evaluate body of '{name}': {source}")]
    Body {
        name: String,
        #[source]
        source: ScriptError,
    },
}

impl ApplyError {
    /// Structural errors invalidate the rule for the current candidate.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ApplyError::ArrayIteratorWithValue { .. }
                | ApplyError::DictionaryIteratorWithoutValue { .. }
                | ApplyError::InvalidIterationSource { .. }
                | ApplyError::UnknownHost { .. }
                | ApplyError::UnlinkableCandidate { .. }
        )
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, ApplyError::Collision { .. })
    }
}

/// Failure to set up the apply engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to build apply worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
