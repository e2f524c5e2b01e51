// deviceaudit-core/src/error.rs
//! Error types for the DeviceAudit core
//!
//! Field-level malformation inside a document is never an error: every
//! access degrades to a default. Errors are reserved for problems that
//! invalidate the whole run (store access, cursor failures, bad config).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The store cursor failed after `position - 1` records were read
    #[error("Cursor failed at record {position}: {reason}")]
    Cursor { position: u64, reason: String },

    #[error("Export error: {0}")]
    Export(String),
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
