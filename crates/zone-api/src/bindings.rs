//! Namespace resolution: memory name -> bound store handle.
//!
//! The table is populated once at startup. Only `KvStore` handles can be bound,
//! and the token registry is held by the [`crate::Authorizer`], outside this
//! table, so no request can resolve it as a namespace.

use std::collections::HashMap;
use std::sync::Arc;
use zone_types::KvStore;

/// Suffix appended to a memory name to form its binding identifier.
pub const BINDING_SUFFIX: &str = "_MEMORY";

/// Binding identifier for a memory name (`notes` -> `notes_MEMORY`).
pub fn binding_name(memory: &str) -> String {
    format!("{}{}", memory, BINDING_SUFFIX)
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("invalid memory name '{0}': use letters, digits, '-' or '_'")]
    InvalidName(String),
    #[error("memory '{0}' is bound twice")]
    Duplicate(String),
}

#[derive(Clone, Default)]
pub struct MemoryBindings {
    stores: HashMap<String, Arc<dyn KvStore>>,
}

impl MemoryBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `memory` to `store` under its binding identifier.
    pub fn bind(&mut self, memory: &str, store: Arc<dyn KvStore>) -> Result<(), BindingError> {
        let valid = !memory.is_empty()
            && memory
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BindingError::InvalidName(memory.to_string()));
        }
        let id = binding_name(memory);
        if self.stores.contains_key(&id) {
            return Err(BindingError::Duplicate(memory.to_string()));
        }
        self.stores.insert(id, store);
        Ok(())
    }

    /// Store bound to `memory`, or `None` when nothing is bound under its identifier.
    pub fn resolve(&self, memory: &str) -> Option<Arc<dyn KvStore>> {
        self.stores.get(&binding_name(memory)).cloned()
    }

    /// Bound binding identifiers, sorted.
    pub fn binding_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.stores.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
