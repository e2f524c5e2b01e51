// deviceaudit-core/src/pipeline.rs
//! The two fixed report pipelines
//!
//! ```text
//! counting:   cursor → predicates ─────────────────────────────→ group count
//! extraction: cursor → predicates → expand → resolve (per doc) → sort → rows
//! ```
//!
//! Both consume the store cursor sequentially. A cursor error aborts the
//! run; an empty collection is a normal, empty result.

use crate::aggregation::{sort_by_recent_activity, CountSummary, GroupCount};
use crate::config::PipelineConfig;
use crate::document::UserDocument;
use crate::error::{AuditError, Result};
use crate::expansion::expand;
use crate::logging::LogSink;
use crate::predicate::PredicateSet;
use crate::resolver::{resolve_pair, FlattenedRecord, ResolvedRow};
use crate::storage::DocumentStore;
use crate::timestamp::threshold_millis;
use crate::{log_debug, log_error, log_info, log_trace, log_warn};
use chrono::{DateTime, Local};

/// Result of the extraction pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    /// Rows ordered by most recent activity
    pub records: Vec<FlattenedRecord>,
    /// Inclusive lower bound used by the recency gate (epoch ms)
    pub threshold_ms: i64,
    pub documents_scanned: u64,
    pub documents_admitted: u64,
}

impl ExtractionReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Extracted {} flattened device/authenticator records",
            self.records.len()
        )
    }
}

/// Feed every document of the configured collection to `visit`
///
/// Returns the number of documents read. Stops at the first cursor error.
fn scan_collection<F>(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    log: &dyn LogSink,
    mut visit: F,
) -> Result<u64>
where
    F: FnMut(UserDocument),
{
    log_info!(log, "Executing scan on '{}' ...", config.collection);
    let cursor = store.cursor(&config.collection).map_err(|e| {
        log_error!(log, "Cannot open collection '{}': {}", config.collection, e);
        if matches!(e, AuditError::CollectionNotFound(_)) {
            if let Ok(names) = store.list_collections() {
                log_error!(log, "Available collections: {:?}", names);
            }
        }
        e
    })?;

    let mut scanned = 0u64;
    for item in cursor {
        let raw = item.map_err(|e| {
            log_error!(log, "Aborting after {} documents: {}", scanned, e);
            e
        })?;
        scanned += 1;
        if !raw.is_object() {
            log_warn!(
                log,
                "Document {} is not an object; every field treated as absent",
                scanned
            );
        }
        visit(UserDocument::from_value(&raw));
    }
    Ok(scanned)
}

/// Count users owning at least one valid device
///
/// A device is valid when `device_id`, `created` and `last_access` are all
/// present. Each user counts once regardless of how many devices qualify.
pub fn count_users_with_valid_devices(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    log: &dyn LogSink,
) -> Result<CountSummary> {
    config.validate()?;
    let predicates = PredicateSet::valid_device_users();
    log_debug!(log, "Counting with rules {:?}", predicates);

    let mut group = GroupCount::new();
    let scanned = scan_collection(store, config, log, |doc| {
        match predicates.first_rejection(&doc) {
            None => group.add(),
            Some(rule) => {
                log_trace!(log, "Skipping {}: {}", doc.user_id_label(), rule.describe())
            }
        }
    })?;

    let summary = group.finish();
    log_debug!(log, "Scanned {} documents", scanned);
    log_info!(log, "{}", summary.summary());
    Ok(summary)
}

/// Flatten recently active users into report rows, using the current time
pub fn extract_active_devices(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    log: &dyn LogSink,
) -> Result<ExtractionReport> {
    extract_active_devices_at(store, config, Local::now(), log)
}

/// Flatten recently active users into report rows
///
/// Admitted documents are expanded into one row per (device,
/// authenticator) pairing, resolved through the fallback chains, and the
/// complete row set is sorted once at the end.
pub fn extract_active_devices_at(
    store: &dyn DocumentStore,
    config: &PipelineConfig,
    now: DateTime<Local>,
    log: &dyn LogSink,
) -> Result<ExtractionReport> {
    config.validate()?;
    let threshold_ms = threshold_millis(now, config.days_threshold);
    log_info!(
        log,
        "Filtering last_access >= {}  ({} days ago)",
        threshold_ms,
        config.days_threshold
    );

    let predicates = PredicateSet::active_users(threshold_ms, &config.exclude_user_id_patterns)?;
    log_debug!(log, "Extracting with rules {:?}", predicates);

    let mut rows: Vec<ResolvedRow> = Vec::new();
    let mut admitted = 0u64;
    let scanned = scan_collection(store, config, log, |doc| {
        if let Some(rule) = predicates.first_rejection(&doc) {
            log_trace!(log, "Skipping {}: {}", doc.user_id_label(), rule.describe());
            return;
        }
        admitted += 1;
        rows.extend(expand(&doc).map(|pair| resolve_pair(&doc, pair)));
    })?;

    sort_by_recent_activity(&mut rows);

    let report = ExtractionReport {
        records: rows.into_iter().map(|row| row.record).collect(),
        threshold_ms,
        documents_scanned: scanned,
        documents_admitted: admitted,
    };
    log_debug!(log, "Admitted {} of {} documents", admitted, scanned);
    log_info!(log, "{}", report.summary());
    Ok(report)
}
