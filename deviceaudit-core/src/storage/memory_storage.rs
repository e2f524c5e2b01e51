// storage/memory_storage.rs
//! Pure in-memory store for tests
//!
//! ```text
//! MemoryStorage (DocumentStore implementation)
//!      ↓
//! HashMap<String, Vec<Value>> (collections -> documents)
//! ```

use crate::error::{AuditError, Result};
use crate::storage::{DocumentCursor, DocumentStore};
use serde_json::Value;
use std::collections::HashMap;

/// In-memory store backend (testing)
///
/// # Examples
///
/// ```
/// use deviceaudit_core::storage::{DocumentStore, MemoryStorage};
/// use serde_json::json;
///
/// let mut store = MemoryStorage::new();
/// store.insert_many("users", vec![json!({"user_id": "u1"})]);
/// assert_eq!(store.cursor("users").unwrap().count(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    collections: HashMap<String, Vec<Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection (no-op if it already exists)
    pub fn create_collection(&mut self, name: &str) {
        self.collections.entry(name.to_string()).or_default();
    }

    /// Append documents to a collection, creating it if needed
    pub fn insert_many(&mut self, collection: &str, docs: Vec<Value>) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn insert_one(&mut self, collection: &str, doc: Value) {
        self.insert_many(collection, vec![doc]);
    }
}

impl DocumentStore for MemoryStorage {
    fn cursor(&self, collection: &str) -> Result<DocumentCursor<'_>> {
        let docs = self
            .collections
            .get(collection)
            .ok_or_else(|| AuditError::CollectionNotFound(collection.to_string()))?;
        Ok(Box::new(docs.iter().cloned().map(Ok::<Value, AuditError>)))
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
