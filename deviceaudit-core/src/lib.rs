// deviceaudit-core/src/lib.rs
// Pure Rust API - store access, filtering, flattening and ordering of
// user device/authenticator documents

pub mod aggregation;
pub mod config;
pub mod document;
pub mod error;
pub mod expansion;
pub mod logging;
pub mod pipeline;
pub mod predicate;
pub mod report;
pub mod resolver;
pub mod storage;
pub mod timestamp;
pub mod value_utils;

// Public exports
pub use aggregation::{sort_by_recent_activity, CountSummary, GroupCount};
pub use config::PipelineConfig;
pub use document::{ArrayField, AuthenticatorRecord, DeviceRecord, UserDocument};
pub use error::{AuditError, Result};
pub use expansion::{expand, CrossProduct};
pub use logging::{LogLevel, LogSink, MemorySink, NullSink, StderrSink};
pub use pipeline::{
    count_users_with_valid_devices, extract_active_devices, extract_active_devices_at,
    ExtractionReport,
};
pub use predicate::{DocumentPredicate, PredicateSet};
pub use report::{export_records, Cell, JsonExportSink, TableSink, TextTableSink, COLUMNS};
pub use resolver::{resolve, FlattenedRecord, ResolvedRow, SortKey};
pub use storage::{DocumentStore, FileStorage, JsonLinesStorage, MemoryStorage};
pub use timestamp::normalize_timestamp;
