// src/aggregation.rs
// Final pipeline stages: single-bucket counting and activity ordering

use crate::resolver::ResolvedRow;
use crate::value_utils::compare_desc_missing_last;
use serde::Serialize;

/// `{$group: {_id: null, count: {$sum: 1}}}` over admitted documents
///
/// Counts documents, never devices or rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupCount {
    count: u64,
}

impl GroupCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one admitted document to the bucket
    pub fn add(&mut self) {
        self.count += 1;
    }

    pub fn finish(self) -> CountSummary {
        CountSummary { count: self.count }
    }
}

/// Result of the counting pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    #[serde(rename = "countOfUsersWithValidDevice")]
    pub count: u64,
}

impl CountSummary {
    /// Human-readable line embedding the count
    pub fn summary(&self) -> String {
        format!(
            "Number of users with ≥1 valid device (device_id + created + last_access present): {}",
            self.count
        )
    }
}

/// Order rows by most recent activity
///
/// Descending by the resolved `last_access` timestamp, ties broken by the
/// authenticator `last_used` timestamp, also descending. Absent timestamps
/// sort last. The sort is stable: rows with equal keys keep their input
/// order. Keys are numeric, so formatted dates never compare as text.
pub fn sort_by_recent_activity(rows: &mut [ResolvedRow]) {
    rows.sort_by(|a, b| {
        compare_desc_missing_last(a.key.last_access_ms, b.key.last_access_ms).then_with(|| {
            compare_desc_missing_last(a.key.auth_last_used_ms, b.key.auth_last_used_ms)
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{FlattenedRecord, SortKey};

    fn row(uid: &str, last_access: Option<f64>, last_used: Option<f64>) -> ResolvedRow {
        ResolvedRow {
            record: FlattenedRecord {
                uid: uid.to_string(),
                device_id: String::new(),
                registered: String::new(),
                last_access: String::new(),
                method: String::new(),
                status: String::new(),
                provider_config_id: String::new(),
                expired: false,
            },
            key: SortKey {
                last_access_ms: last_access,
                auth_last_used_ms: last_used,
            },
        }
    }

    fn uids(rows: &[ResolvedRow]) -> Vec<&str> {
        rows.iter().map(|r| r.record.uid.as_str()).collect()
    }

    #[test]
    fn test_group_count() {
        let mut group = GroupCount::new();
        assert_eq!(group.finish().count, 0);
        group.add();
        group.add();
        let summary = group.finish();
        assert_eq!(summary.count, 2);
        assert!(summary.summary().ends_with(": 2"));
    }

    #[test]
    fn test_count_summary_serializes_with_result_key() {
        let json = serde_json::to_value(CountSummary { count: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"countOfUsersWithValidDevice": 3}));
    }

    #[test]
    fn test_sort_primary_descending_missing_last() {
        let mut rows = vec![
            row("none", None, None),
            row("old", Some(1_000.0), None),
            row("new", Some(9_000.0), None),
            row("mid", Some(5_000.0), None),
        ];
        sort_by_recent_activity(&mut rows);
        assert_eq!(uids(&rows), vec!["new", "mid", "old", "none"]);
    }

    #[test]
    fn test_sort_secondary_breaks_ties() {
        let mut rows = vec![
            row("a", Some(5_000.0), None),
            row("b", Some(5_000.0), Some(100.0)),
            row("c", Some(5_000.0), Some(900.0)),
        ];
        sort_by_recent_activity(&mut rows);
        assert_eq!(uids(&rows), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_keys() {
        let mut rows = vec![
            row("first", Some(5_000.0), Some(1.0)),
            row("top", Some(6_000.0), None),
            row("second", Some(5_000.0), Some(1.0)),
            row("third", Some(5_000.0), Some(1.0)),
        ];
        sort_by_recent_activity(&mut rows);
        assert_eq!(uids(&rows), vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_sort_is_numeric_not_lexicographic() {
        // 9e11 formats to an earlier date than 1e12 but sorts after as text
        let mut rows = vec![
            row("smaller", Some(900_000_000_000.0), None),
            row("larger", Some(1_000_000_000_000.0), None),
        ];
        sort_by_recent_activity(&mut rows);
        assert_eq!(uids(&rows), vec!["larger", "smaller"]);
    }
}
