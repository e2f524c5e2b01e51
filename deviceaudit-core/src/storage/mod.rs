// storage/mod.rs
//! Read-only document stores feeding the pipelines
//!
//! ```text
//! DocumentStore trait (sequential cursor per collection)
//!   ├── MemoryStorage    (tests, in-memory Vec per collection)
//!   ├── FileStorage      (one JSON file: {"<collection>": [docs...]})
//!   └── JsonLinesStorage (directory of <collection>.jsonl, streamed)
//! ```

pub mod file_storage;
pub mod jsonl_storage;
pub mod memory_storage;
pub mod traits;

pub use file_storage::FileStorage;
pub use jsonl_storage::JsonLinesStorage;
pub use memory_storage::MemoryStorage;
pub use traits::{DocumentCursor, DocumentStore};
