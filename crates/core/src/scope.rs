//! Lexically-scoped variable frames.
//!
//! A [`Scope`] owns one frame of bindings and optionally points at an
//! immutable parent. Rule closures are stored as frozen `Arc<Scope>`
//! snapshots and realized into fresh evaluation frames with
//! [`Scope::copy_into`]; the snapshot itself is never written to.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: IndexMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty frame whose lookups fall through to `parent`.
    pub fn new_child(parent: Arc<Scope>) -> Self {
        Self {
            vars: IndexMap::new(),
            parent: Some(parent),
        }
    }

    /// Bind `name` in this frame, shadowing any parent binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Resolve `name`, walking up the parent chain.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(v) => Some(v),
            None => self.parent.as_deref().and_then(|p| p.get(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Shallow-copy every visible binding into `target`.
    ///
    /// Parent bindings are copied first so that shadowing in this frame is
    /// preserved. Existing bindings in `target` with the same names are
    /// overwritten.
    pub fn copy_into(&self, target: &mut Scope) {
        if let Some(parent) = &self.parent {
            parent.copy_into(target);
        }
        for (name, value) in &self.vars {
            target.vars.insert(name.clone(), value.clone());
        }
    }

    /// Bindings of this frame only, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings in this frame (parents excluded).
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.parent.as_ref().map_or(true, |p| p.is_empty())
    }

    /// Freeze into an immutable snapshot suitable for sharing across threads.
    pub fn freeze(self) -> Arc<Scope> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_falls_through_to_parent() {
        let mut root = Scope::new();
        root.set("zone", Value::from("eu"));
        let root = root.freeze();

        let mut child = Scope::new_child(Arc::clone(&root));
        assert_eq!(child.get("zone"), Some(&Value::from("eu")));
        assert_eq!(child.get("missing"), None);

        child.set("zone", Value::from("us"));
        assert_eq!(child.get("zone"), Some(&Value::from("us")));
        assert_eq!(root.get("zone"), Some(&Value::from("eu")));
    }

    #[test]
    fn copy_into_keeps_shadowing_and_leaves_source_untouched() {
        let mut root = Scope::new();
        root.set("a", Value::Number(1.0));
        root.set("b", Value::Number(2.0));
        let mut closure = Scope::new_child(root.freeze());
        closure.set("b", Value::Number(20.0));
        let closure = closure.freeze();

        let mut frame = Scope::new();
        frame.set("host", Value::from("web1"));
        closure.copy_into(&mut frame);
        frame.set("a", Value::Number(100.0));

        assert_eq!(frame.get("a"), Some(&Value::Number(100.0)));
        assert_eq!(frame.get("b"), Some(&Value::Number(20.0)));
        assert_eq!(frame.get("host"), Some(&Value::from("web1")));
        assert_eq!(closure.get("a"), Some(&Value::Number(1.0)));
        assert!(!closure.contains("host"));
    }

    #[test]
    fn empty_scope_reports_empty() {
        let child = Scope::new_child(Scope::new().freeze());
        assert!(child.is_empty());
        assert_eq!(child.len(), 0);
    }
}
