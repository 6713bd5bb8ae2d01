//! Tree-walking evaluation of [`Expr`] against a [`Frame`].

use std::cmp::Ordering;

use vigil_core::{Dictionary, Scope, ScriptError, Value};

use super::Expr;

/// Evaluation context: read-only locals plus the fields of the object under
/// construction, if any.
///
/// Variable lookup checks locals first, then the object's fields.
pub struct Frame<'a> {
    locals: &'a Scope,
    this: Option<&'a mut Dictionary>,
}

impl<'a> Frame<'a> {
    pub fn new(locals: &'a Scope) -> Self {
        Self { locals, this: None }
    }

    pub fn with_this(locals: &'a Scope, this: &'a mut Dictionary) -> Self {
        Self {
            locals,
            this: Some(this),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .get(name)
            .or_else(|| self.this.as_deref().and_then(|t| t.get(name)))
    }
}

impl Expr {
    pub fn evaluate(&self, frame: &mut Frame<'_>) -> Result<Value, ScriptError> {
        match self {
            Expr::Lit(v) => Ok(v.clone()),
            Expr::Var(path) => resolve_path(frame, path),
            Expr::Index(container, key) => {
                let container = container.evaluate(frame)?;
                let key = key.evaluate(frame)?;
                index(&container, &key)
            }
            Expr::Eq(lhs, rhs) => Ok(Value::Bool(lhs.evaluate(frame)? == rhs.evaluate(frame)?)),
            Expr::Ne(lhs, rhs) => Ok(Value::Bool(lhs.evaluate(frame)? != rhs.evaluate(frame)?)),
            Expr::Lt(lhs, rhs) => compare(frame, lhs, rhs, "<", |o| o == Ordering::Less),
            Expr::Le(lhs, rhs) => compare(frame, lhs, rhs, "<=", |o| o != Ordering::Greater),
            Expr::Gt(lhs, rhs) => compare(frame, lhs, rhs, ">", |o| o == Ordering::Greater),
            Expr::Ge(lhs, rhs) => compare(frame, lhs, rhs, ">=", |o| o != Ordering::Less),
            Expr::And(operands) => {
                for operand in operands {
                    if !operand.evaluate(frame)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expr::Or(operands) => {
                for operand in operands {
                    if operand.evaluate(frame)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Expr::Not(inner) => Ok(Value::Bool(!inner.evaluate(frame)?.is_truthy())),
            Expr::In(needle, haystack) => {
                let needle = needle.evaluate(frame)?;
                match haystack.evaluate(frame)? {
                    Value::Array(items) => Ok(Value::Bool(items.contains(&needle))),
                    Value::Dictionary(dict) => {
                        Ok(Value::Bool(dict.contains_key(&needle.to_string())))
                    }
                    Value::Empty => Ok(Value::Bool(false)),
                    other => Err(ScriptError::new(format!(
                        "Operator 'in' can't be applied to a value of type '{}'",
                        other.type_name()
                    ))),
                }
            }
            Expr::Match(pattern, value) => {
                let pattern = pattern.evaluate(frame)?;
                let pattern = pattern.as_str().ok_or_else(|| {
                    ScriptError::new(format!(
                        "match() pattern must be a String, got '{}'",
                        pattern.type_name()
                    ))
                })?;
                let text = value.evaluate(frame)?.to_string();
                Ok(Value::Bool(glob_match(pattern, &text)))
            }
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    out.push_str(&part.evaluate(frame)?.to_string());
                }
                Ok(Value::String(out))
            }
            Expr::Array(items) => items
                .iter()
                .map(|item| item.evaluate(frame))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Dict(entries) => {
                let mut dict = Dictionary::new();
                for (key, item) in entries {
                    dict.insert(key.clone(), item.evaluate(frame)?);
                }
                Ok(Value::Dictionary(dict))
            }
            Expr::Set { field, value } => {
                let value = value.evaluate(frame)?;
                let this = frame.this.as_deref_mut().ok_or_else(|| {
                    ScriptError::new(format!(
                        "Tried to set field '{}' outside of an object",
                        field
                    ))
                })?;
                assign(this, field, value)?;
                Ok(Value::Empty)
            }
            Expr::Block(exprs) => {
                let mut last = Value::Empty;
                for expr in exprs {
                    last = expr.evaluate(frame)?;
                }
                Ok(last)
            }
        }
    }
}

fn resolve_path(frame: &Frame<'_>, path: &str) -> Result<Value, ScriptError> {
    let mut segments = path.split('.');
    let root = segments.next().unwrap_or_default();
    let mut current = frame.lookup(root).cloned().ok_or_else(|| {
        ScriptError::new(format!(
            "Tried to access undefined script variable '{}'",
            root
        ))
    })?;

    for segment in segments {
        current = match current {
            Value::Dictionary(mut dict) => dict.shift_remove(segment).unwrap_or_default(),
            Value::Empty => Value::Empty,
            other => {
                return Err(ScriptError::new(format!(
                    "Tried to access field '{}' on a value of type '{}'",
                    segment,
                    other.type_name()
                )))
            }
        };
    }

    Ok(current)
}

fn index(container: &Value, key: &Value) -> Result<Value, ScriptError> {
    match container {
        Value::Array(items) => {
            let idx = key
                .as_number()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0)
                .ok_or_else(|| {
                    ScriptError::new(format!("Invalid array index '{}'", key))
                })?;
            items
                .get(idx as usize)
                .cloned()
                .ok_or_else(|| ScriptError::new(format!("Array index '{}' is out of bounds", key)))
        }
        Value::Dictionary(dict) => Ok(dict.get(&key.to_string()).cloned().unwrap_or_default()),
        Value::Empty => Ok(Value::Empty),
        other => Err(ScriptError::new(format!(
            "Can't index a value of type '{}'",
            other.type_name()
        ))),
    }
}

fn compare(
    frame: &mut Frame<'_>,
    lhs: &Expr,
    rhs: &Expr,
    op: &str,
    accept: impl Fn(Ordering) -> bool,
) -> Result<Value, ScriptError> {
    let lhs = lhs.evaluate(frame)?;
    let rhs = rhs.evaluate(frame)?;
    let ordering = match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.map(|o| Value::Bool(accept(o))).ok_or_else(|| {
        ScriptError::new(format!(
            "Operator {} cannot be applied to values of type '{}' and '{}'",
            op,
            lhs.type_name(),
            rhs.type_name()
        ))
    })
}

/// Write `value` at a dotted `field` path, creating intermediate dictionaries.
fn assign(this: &mut Dictionary, field: &str, value: Value) -> Result<(), ScriptError> {
    let mut segments: Vec<&str> = field.split('.').collect();
    let leaf = segments.pop().unwrap_or_default();
    let mut target = this;

    for segment in segments {
        let slot = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Dictionary(Dictionary::new()));
        if slot.is_empty() {
            *slot = Value::Dictionary(Dictionary::new());
        }
        target = match slot {
            Value::Dictionary(dict) => dict,
            other => {
                return Err(ScriptError::new(format!(
                    "Can't set field '{}': '{}' is a '{}', not a Dictionary",
                    field,
                    segment,
                    other.type_name()
                )))
            }
        };
    }

    target.insert(leaf.to_string(), value);
    Ok(())
}

/// Shell-style wildcard match supporting `*` and `?`.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
