//! Document envelope for lightweight first-pass deserialization.

use serde::{Deserialize, Serialize};

use crate::expr;

use super::{ApplyDef, ConfigDocument, DocumentKind, LocalsDef, ObjectDef};

/// First-pass view of a document: the `kind` header plus everything else.
///
/// Used during two-pass loading: first extract `kind` to pick the concrete
/// type, then deserialize the remaining fields into it. The concrete types
/// reject unknown fields, so typos surface as load errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub kind: String,
    /// Remaining fields captured as raw YAML for second-pass deserialization.
    #[serde(flatten)]
    pub rest: serde_yaml::Mapping,
}

impl DocumentEnvelope {
    pub fn document_kind(&self) -> std::result::Result<DocumentKind, String> {
        self.kind.parse()
    }

    /// Second pass: deserialize the remaining fields into the concrete type.
    pub fn parse_full(&self) -> std::result::Result<ConfigDocument, String> {
        let rest = serde_yaml::Value::Mapping(self.rest.clone());
        let document = match self.document_kind()? {
            DocumentKind::Locals => {
                ConfigDocument::Locals(expr::from_yaml_value::<LocalsDef>(rest).map_err(|e| e.to_string())?)
            }
            DocumentKind::Object => {
                ConfigDocument::Object(expr::from_yaml_value::<ObjectDef>(rest).map_err(|e| e.to_string())?)
            }
            DocumentKind::Apply => {
                ConfigDocument::Apply(expr::from_yaml_value::<ApplyDef>(rest).map_err(|e| e.to_string())?)
            }
        };
        Ok(document)
    }
}
