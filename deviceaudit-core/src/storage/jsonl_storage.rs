// storage/jsonl_storage.rs
//! Directory of newline-delimited JSON collections
//!
//! Collection `users` lives in `<dir>/users.jsonl`, one document per line.
//! Cursors stream the file line by line, so collections larger than memory
//! can be scanned. A line that fails to read or parse ends the cursor with
//! an error carrying its line number.

use crate::error::{AuditError, Result};
use crate::storage::{DocumentCursor, DocumentStore};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

const EXTENSION: &str = "jsonl";

/// Streaming directory-backed store
#[derive(Debug, Clone)]
pub struct JsonLinesStorage {
    dir: PathBuf,
}

impl JsonLinesStorage {
    /// Use `dir` as the store root; it must be an existing directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(AuditError::InvalidConfig(format!(
                "Store path is not a directory: {}",
                dir.display()
            )));
        }
        Ok(JsonLinesStorage { dir })
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        if collection.is_empty()
            || collection.contains(['/', '\\'])
            || collection.starts_with('.')
        {
            return Err(AuditError::InvalidConfig(format!(
                "Invalid collection name: '{}'",
                collection
            )));
        }
        Ok(self.dir.join(format!("{}.{}", collection, EXTENSION)))
    }
}

/// Line-by-line document reader
struct JsonLinesCursor {
    lines: Lines<BufReader<File>>,
    line_no: u64,
    failed: bool,
}

impl Iterator for JsonLinesCursor {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let parsed = line
                .map_err(|e| e.to_string())
                .and_then(|text| {
                    if text.trim().is_empty() {
                        Ok(None)
                    } else {
                        serde_json::from_str::<Value>(&text)
                            .map(Some)
                            .map_err(|e| e.to_string())
                    }
                });

            match parsed {
                Ok(None) => continue,
                Ok(Some(doc)) => return Some(Ok(doc)),
                Err(reason) => {
                    self.failed = true;
                    return Some(Err(AuditError::Cursor {
                        position: self.line_no,
                        reason,
                    }));
                }
            }
        }
    }
}

impl DocumentStore for JsonLinesStorage {
    fn cursor(&self, collection: &str) -> Result<DocumentCursor<'_>> {
        let path = self.collection_path(collection)?;
        if !path.is_file() {
            return Err(AuditError::CollectionNotFound(collection.to_string()));
        }
        let file = File::open(&path)?;
        Ok(Box::new(JsonLinesCursor {
            lines: BufReader::new(file).lines(),
            line_no: 0,
            failed: false,
        }))
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, JsonLinesStorage) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let store = JsonLinesStorage::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_streams_documents_skipping_blank_lines() {
        let (_dir, store) = store_with(&[(
            "users.jsonl",
            "{\"user_id\": \"u1\"}\n\n   \n{\"user_id\": \"u2\"}\n",
        )]);
        let docs: Vec<Value> = store.cursor("users").unwrap().map(|d| d.unwrap()).collect();
        assert_eq!(docs, vec![json!({"user_id": "u1"}), json!({"user_id": "u2"})]);
    }

    #[test]
    fn test_corrupt_line_ends_cursor_with_position() {
        let (_dir, store) = store_with(&[(
            "users.jsonl",
            "{\"user_id\": \"u1\"}\n{not json\n{\"user_id\": \"u3\"}\n",
        )]);
        let items: Vec<Result<Value>> = store.cursor("users").unwrap().collect();

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(AuditError::Cursor { position, .. }) => assert_eq!(*position, 2),
            other => panic!("expected cursor error, got {:?}", other.as_ref().map(|_| ())),
        }
    }

    #[test]
    fn test_missing_collection() {
        let (_dir, store) = store_with(&[]);
        let err = store.cursor("users").err().unwrap();
        assert!(matches!(err, AuditError::CollectionNotFound(_)));
    }

    #[test]
    fn test_rejects_path_like_collection_names() {
        let (_dir, store) = store_with(&[]);
        for name in ["", "../users", "a/b", ".hidden"] {
            let err = store.cursor(name).err().unwrap();
            assert!(matches!(err, AuditError::InvalidConfig(_)), "{name}");
        }
    }

    #[test]
    fn test_list_collections() {
        let (_dir, store) = store_with(&[
            ("users.jsonl", ""),
            ("admins.jsonl", ""),
            ("notes.txt", "ignored"),
        ]);
        assert_eq!(store.list_collections().unwrap(), vec!["admins", "users"]);
    }

    #[test]
    fn test_open_requires_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.jsonl");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            JsonLinesStorage::open(&file).unwrap_err(),
            AuditError::InvalidConfig(_)
        ));
    }
}
