// storage/file_storage.rs
//! Single-file JSON store
//!
//! Reads the export layout `{ "<collection>": [documents...], ... }` once at
//! open time and serves cursors from memory.
//!
//! ```text
//! FileStorage (DocumentStore implementation)
//!      ↓
//! MemoryStorage (parsed collections)
//!      ↓
//! data.json
//! ```

use crate::error::{AuditError, Result};
use crate::storage::{DocumentCursor, DocumentStore, MemoryStorage};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// File-based store backend
///
/// # Examples
///
/// ```ignore
/// use deviceaudit_core::storage::FileStorage;
///
/// let store = FileStorage::open("users.json")?;
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    inner: MemoryStorage,
}

impl FileStorage {
    /// Open and parse a JSON store file
    ///
    /// The root must be an object whose values are arrays of documents.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let root: Map<String, Value> = serde_json::from_str(&content).map_err(|e| {
            AuditError::Serialization(format!(
                "{}: root must map collection names to document arrays ({})",
                path.display(),
                e
            ))
        })?;

        let mut inner = MemoryStorage::new();
        for (collection, documents) in root {
            match documents {
                Value::Array(docs) => inner.insert_many(&collection, docs),
                _ => {
                    return Err(AuditError::Serialization(format!(
                        "Collection '{}' must be an array",
                        collection
                    )))
                }
            }
        }

        Ok(FileStorage { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for FileStorage {
    fn cursor(&self, collection: &str) -> Result<DocumentCursor<'_>> {
        self.inner.cursor(collection)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        self.inner.list_collections()
    }
}
