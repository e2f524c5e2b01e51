// storage/traits.rs
//! Store abstraction for the pipelines
//!
//! The core never manages connections: it only asks a store for a
//! sequential, fallible cursor over one collection. Backends decide how
//! documents are fetched; the pipelines decide what to do with them.

use crate::error::Result;
use serde_json::Value;

/// Sequential cursor over raw stored documents
///
/// An `Err` item means the cursor broke mid-stream; consumers must abort
/// rather than treat the documents read so far as a complete result.
pub type DocumentCursor<'a> = Box<dyn Iterator<Item = Result<Value>> + 'a>;

/// Read-only source of schemaless documents
///
/// # Implementations
///
/// - **MemoryStorage**: in-memory collections for tests
/// - **FileStorage**: single JSON file holding every collection
/// - **JsonLinesStorage**: one newline-delimited file per collection
pub trait DocumentStore {
    /// Open a cursor over every document of `collection`
    ///
    /// Fails with `CollectionNotFound` when the collection does not exist;
    /// an existing but empty collection yields an empty cursor.
    fn cursor(&self, collection: &str) -> Result<DocumentCursor<'_>>;

    /// Names of the collections this store holds, sorted
    fn list_collections(&self) -> Result<Vec<String>>;
}
