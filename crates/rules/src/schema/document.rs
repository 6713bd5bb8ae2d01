//! Multi-kind configuration document container and accessors.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vigil_core::{Scope, ScriptError};

use super::{ApplyDef, ObjectDef};
use crate::expr::{Expr, Frame};

/// Document kinds a configuration file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Locals,
    Object,
    Apply,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Locals => write!(f, "Locals"),
            DocumentKind::Object => write!(f, "Object"),
            DocumentKind::Apply => write!(f, "Apply"),
        }
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Locals" => Ok(DocumentKind::Locals),
            "Object" => Ok(DocumentKind::Object),
            "Apply" => Ok(DocumentKind::Apply),
            other => Err(format!("unknown document kind: '{}'", other)),
        }
    }
}

/// File-level variables, evaluated in order into the file scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalsDef {
    #[serde(default)]
    pub vars: IndexMap<String, Expr>,
}

impl LocalsDef {
    /// Evaluate each variable against `scope` and bind it there. Later
    /// variables see the earlier ones.
    pub fn apply_to(&self, scope: &mut Scope) -> Result<(), ScriptError> {
        for (name, expr) in &self.vars {
            let value = expr.evaluate(&mut Frame::new(scope))?;
            scope.set(name.clone(), value);
        }
        Ok(())
    }
}

/// A fully deserialized document of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDocument {
    Locals(LocalsDef),
    Object(ObjectDef),
    Apply(ApplyDef),
}

impl ConfigDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            ConfigDocument::Locals(_) => DocumentKind::Locals,
            ConfigDocument::Object(_) => DocumentKind::Object,
            ConfigDocument::Apply(_) => DocumentKind::Apply,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectDef> {
        match self {
            ConfigDocument::Object(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_apply(&self) -> Option<&ApplyDef> {
        match self {
            ConfigDocument::Apply(def) => Some(def),
            _ => None,
        }
    }
}
