//! Object registry: committed configuration objects keyed by type and name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::map::Entry;
use indexmap::IndexMap;
use vigil_core::{ConfigObject, DebugInfo};

/// Errors raised when committing an object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitError {
    #[error("An object with type '{type_name}' and name '{name}' already exists{}", .existing_origin.as_ref().map(|di| format!(" ({di})")).unwrap_or_default())]
    Collision {
        type_name: String,
        name: String,
        existing_origin: Option<DebugInfo>,
    },
}

/// Storage seam between the apply engine and the platform's object graph.
///
/// `commit` must perform the uniqueness check and the insert as one atomic
/// step: two concurrent commits of the same identity never both succeed.
pub trait ObjectStore: Send + Sync {
    fn get(&self, type_name: &str, name: &str) -> Option<Arc<ConfigObject>>;

    /// All objects of `type_name` in commit order.
    fn objects_of_type(&self, type_name: &str) -> Vec<Arc<ConfigObject>>;

    fn commit(&self, object: ConfigObject) -> Result<Arc<ConfigObject>, CommitError>;
}

/// In-memory [`ObjectStore`], append-only.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: RwLock<HashMap<String, IndexMap<String, Arc<ConfigObject>>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub object_count: usize,
    pub objects_by_type: HashMap<String, usize>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .expect("object registry lock poisoned")
            .values()
            .map(IndexMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        let objects = self.objects.read().expect("object registry lock poisoned");
        let objects_by_type: HashMap<String, usize> = objects
            .iter()
            .map(|(type_name, by_name)| (type_name.clone(), by_name.len()))
            .collect();
        RegistryStats {
            object_count: objects_by_type.values().sum(),
            objects_by_type,
        }
    }

    /// Every object, grouped by type name (sorted) and in commit order within a type.
    pub fn all_objects(&self) -> Vec<Arc<ConfigObject>> {
        let objects = self.objects.read().expect("object registry lock poisoned");
        let mut types: Vec<&String> = objects.keys().collect();
        types.sort();
        types
            .into_iter()
            .flat_map(|t| objects[t].values().cloned())
            .collect()
    }
}

impl ObjectStore for ObjectRegistry {
    fn get(&self, type_name: &str, name: &str) -> Option<Arc<ConfigObject>> {
        self.objects
            .read()
            .expect("object registry lock poisoned")
            .get(type_name)
            .and_then(|by_name| by_name.get(name))
            .cloned()
    }

    fn objects_of_type(&self, type_name: &str) -> Vec<Arc<ConfigObject>> {
        self.objects
            .read()
            .expect("object registry lock poisoned")
            .get(type_name)
            .map(|by_name| by_name.values().cloned().collect())
            .unwrap_or_default()
    }

    fn commit(&self, object: ConfigObject) -> Result<Arc<ConfigObject>, CommitError> {
        let mut objects = self.objects.write().expect("object registry lock poisoned");
        let by_name = objects.entry(object.type_name.clone()).or_default();

        match by_name.entry(object.name.clone()) {
            Entry::Occupied(existing) => Err(CommitError::Collision {
                type_name: object.type_name,
                name: object.name,
                existing_origin: existing.get().origin.clone(),
            }),
            Entry::Vacant(slot) => Ok(Arc::clone(slot.insert(Arc::new(object)))),
        }
    }
}
