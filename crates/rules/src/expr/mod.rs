//! Pre-compiled expression trees.
//!
//! Expressions arrive already parsed; in configuration files they are written
//! as externally-tagged YAML, e.g.
//!
//! ```yaml
//! and:
//!   - eq: [{ var: host.vars.os }, { lit: Linux }]
//!   - not: { in: [{ lit: lab }, { var: host.groups }] }
//! ```
//!
//! serde_yaml only reads that single-key map form for enums when wrapped in
//! `singleton_map_recursive`; anything embedding expressions must be
//! deserialized through [`from_yaml_value`] or [`from_yaml_str`].

mod eval;


use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use vigil_core::Value;

pub use eval::Frame;

// ── YAML ────────────────────────────────────────────────────────────

/// Deserialize `T` from a YAML value, reading enums in single-key map form.
pub fn from_yaml_value<T: DeserializeOwned>(value: serde_yaml::Value) -> Result<T, serde_yaml::Error> {
    serde_yaml::with::singleton_map_recursive::deserialize(value)
}

/// Deserialize `T` from YAML text, reading enums in single-key map form.
pub fn from_yaml_str<T: DeserializeOwned>(yaml: &str) -> Result<T, serde_yaml::Error> {
    serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(yaml))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Constant value.
    Lit(Value),
    /// Dotted variable path: `host.vars.os`.
    Var(String),
    /// `container[key]` for arrays (numeric index) and dictionaries.
    Index(Box<Expr>, Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    Le(Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Ge(Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Membership: `needle in haystack` (array element or dictionary key).
    In(Box<Expr>, Box<Expr>),
    /// Glob match: `match(pattern, value)` with `*` and `?` wildcards.
    Match(Box<Expr>, Box<Expr>),
    /// String concatenation of every operand's string form.
    Concat(Vec<Expr>),
    Array(Vec<Expr>),
    Dict(IndexMap<String, Expr>),
    /// Assign a field of the object being built.
    Set { field: String, value: Box<Expr> },
    /// Evaluate in order, yielding the last value.
    Block(Vec<Expr>),
}

impl Expr {
    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Lit(value.into())
    }

    pub fn var(path: impl Into<String>) -> Self {
        Expr::Var(path.into())
    }

    pub fn set(field: impl Into<String>, value: Expr) -> Self {
        Expr::Set {
            field: field.into(),
            value: Box::new(value),
        }
    }

    pub fn equals(lhs: Expr, rhs: Expr) -> Self {
        Expr::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn negate(inner: Expr) -> Self {
        Expr::Not(Box::new(inner))
    }
}
