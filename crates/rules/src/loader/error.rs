//! Error types and load result structures for the configuration loader.

use std::path::PathBuf;

use vigil_core::{DebugInfo, ScriptError};

use crate::apply::DefinitionError;
use crate::store::CommitError;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error of one document.
    #[error("YAML parse error ({origin}): {source}")]
    Parse {
        origin: DebugInfo,
        #[source]
        source: serde_yaml::Error,
    },

    /// Document is well-formed YAML but not a valid declaration.
    #[error("Validation error ({origin}): {message}")]
    Validation { origin: DebugInfo, message: String },

    /// A `Locals` expression failed to evaluate.
    #[error("Evaluation error: {0}")]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Outcome of loading a single configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

impl LoadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// File was loaded; counts of committed objects and registered rules.
    Loaded { objects: usize, rules: usize },
    /// File was skipped (dotfile, non-YAML, etc.).
    Skipped { reason: String },
    /// Parse, validation or commit error occurred.
    Failed { error: String },
}
