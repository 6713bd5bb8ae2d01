//! Filesystem configuration loader.
//!
//! Scans the configuration directory for YAML files, splits each into `---`
//! separated documents, and feeds them to the object registry and the apply
//! rule registry. Documents are parsed two-pass (DocumentEnvelope -> ConfigDocument).

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::{split_documents, ConfigLoader, ParsedDocument, SourceDocument};
pub use self::error::{LoadResult, LoadStatus, LoaderError, Result};
