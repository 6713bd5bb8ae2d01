//! YAML configuration schema with serde deserialization.
//!
//! A configuration file holds one or more documents separated by `---`:
//! - `DocumentEnvelope`: lightweight first pass reading only `kind`
//! - `ConfigDocument`: enum dispatching to `LocalsDef`, `ObjectDef`, `ApplyDef`
//! - `RuleKind`: the object types apply rules can synthesize

mod apply;
mod document;
mod envelope;
mod kind;
mod object;

pub use apply::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use object::*;

#[cfg(test)]
mod tests;
