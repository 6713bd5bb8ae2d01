use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered dictionary type used for object attributes and mapping values.
pub type Dictionary = IndexMap<String, Value>;

/// A dynamically-typed configuration value.
///
/// Dictionaries keep insertion order so iteration over a mapping is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
}

impl Value {
    /// Human-readable name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "Empty",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Dictionary(_) => "Dictionary",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Truth value used by filters: empty, `false`, `0`, `""` and empty
    /// containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Empty => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Dictionary(d) => !d.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Look up a key when this value is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dictionary().and_then(|d| d.get(key))
    }
}

fn fmt_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => fmt_number(f, *n),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(" ]")
            }
            Value::Dictionary(dict) => {
                f.write_str("{ ")?;
                for (i, (key, item)) in dict.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", key, item)?;
                }
                f.write_str(" }")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dictionary(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_drop_zero_fraction() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(-42.0).to_string(), "-42");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Empty.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Number(3.0).is_truthy());
        assert!(Value::Array(vec![Value::Empty]).is_truthy());
    }

    #[test]
    fn yaml_mapping_keeps_insertion_order() {
        let value: Value = serde_yaml::from_str("{ zeta: 1, alpha: two, mid: [true, ~] }").unwrap();
        let dict = value.as_dictionary().expect("dictionary");
        let keys: Vec<&str> = dict.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(dict["zeta"], Value::Number(1.0));
        assert_eq!(dict["alpha"], Value::from("two"));
        assert_eq!(
            dict["mid"],
            Value::Array(vec![Value::Bool(true), Value::Empty])
        );
    }

    #[test]
    fn display_containers() {
        let mut dict = Dictionary::new();
        dict.insert("a".to_string(), Value::Number(1.0));
        dict.insert("b".to_string(), Value::from("x"));
        assert_eq!(Value::Dictionary(dict).to_string(), "{ a = 1, b = x }");
        assert_eq!(
            Value::Array(vec![Value::from("eth0"), Value::Number(2.0)]).to_string(),
            "[ eth0, 2 ]"
        );
    }
}
