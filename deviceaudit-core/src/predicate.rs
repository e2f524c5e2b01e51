// src/predicate.rs
//! Document admission predicates
//!
//! Each rule is a separate type implementing `DocumentPredicate`; a
//! `PredicateSet` ANDs them together and reports the first rule that
//! rejected a document.
//!
//! ```text
//! PredicateSet (AND)
//!     ↓
//! ┌───────────────┬────────────────┬──────────────────┬────────────────┐
//! │ NonEmptyArray │ HasValidDevice │ UserIdPresent    │ RecentActivity │
//! │               │                │ UserIdExclusion* │                │
//! └───────────────┴────────────────┴──────────────────┴────────────────┘
//! ```
//!
//! Predicates are pure: they read an immutable `UserDocument` and hold no
//! mutable state.

use crate::document::{ArrayField, UserDocument};
use crate::error::{AuditError, Result};
use crate::value_utils::number_gte;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Ephemeral accounts: `eph.` prefix
pub const EPHEMERAL_USER_ID_PATTERN: &str = r"^eph\.";

/// Machine-generated accounts: exactly 18 digits
pub const NUMERIC_USER_ID_PATTERN: &str = r"^[0-9]{18}$";

lazy_static! {
    /// Compiled exclusion patterns keyed by source, seeded with the defaults
    static ref PATTERN_CACHE: Mutex<HashMap<String, Regex>> = {
        let mut cache = HashMap::new();
        for source in [EPHEMERAL_USER_ID_PATTERN, NUMERIC_USER_ID_PATTERN] {
            let regex = Regex::new(source).expect("default pattern compiles");
            cache.insert(source.to_string(), regex);
        }
        Mutex::new(cache)
    };
}

/// Get or compile a user_id exclusion pattern
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    if let Some(regex) = PATTERN_CACHE.lock().get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|e| AuditError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    PATTERN_CACHE
        .lock()
        .insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

/// A single admit/reject rule over a user document
pub trait DocumentPredicate: Send + Sync {
    /// Short rule name used in rejection logs
    fn name(&self) -> &'static str;

    /// `true` admits the document
    fn evaluate(&self, doc: &UserDocument) -> bool;

    /// Human-readable description (defaults to the name)
    fn describe(&self) -> String {
        self.name().to_string()
    }
}

// ============================================================================
// ARRAY RULES
// ============================================================================

/// The named array must exist and hold at least one element
pub struct NonEmptyArray {
    field: ArrayField,
}

impl NonEmptyArray {
    pub fn new(field: ArrayField) -> Self {
        NonEmptyArray { field }
    }
}

impl DocumentPredicate for NonEmptyArray {
    fn name(&self) -> &'static str {
        "non_empty_array"
    }

    fn evaluate(&self, doc: &UserDocument) -> bool {
        doc.array_len(self.field).is_some_and(|len| len > 0)
    }

    fn describe(&self) -> String {
        format!("{}({})", self.name(), self.field.as_str())
    }
}

/// At least one device carries `device_id`, `created` and `last_access`
///
/// All three checks apply to the same element; fields spread across
/// different elements do not qualify.
pub struct HasValidDevice;

impl DocumentPredicate for HasValidDevice {
    fn name(&self) -> &'static str {
        "valid_device"
    }

    fn evaluate(&self, doc: &UserDocument) -> bool {
        doc.devices().iter().any(|device| device.is_valid())
    }
}

// ============================================================================
// IDENTIFIER RULES
// ============================================================================

/// `user_id` exists and is not null
pub struct UserIdPresent;

impl DocumentPredicate for UserIdPresent {
    fn name(&self) -> &'static str {
        "user_id_present"
    }

    fn evaluate(&self, doc: &UserDocument) -> bool {
        matches!(&doc.user_id, Some(v) if !v.is_null())
    }
}

/// Rejects documents whose string `user_id` matches a pattern
///
/// Only string identifiers can match; absent or non-string identifiers
/// pass this rule (presence is checked by `UserIdPresent`).
pub struct UserIdExclusion {
    pattern: Regex,
}

impl UserIdExclusion {
    /// Build an exclusion from a regex source
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(UserIdExclusion {
            pattern: compile_pattern(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for UserIdExclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdExclusion")
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl DocumentPredicate for UserIdExclusion {
    fn name(&self) -> &'static str {
        "user_id_exclusion"
    }

    fn evaluate(&self, doc: &UserDocument) -> bool {
        match &doc.user_id {
            Some(Value::String(s)) => !self.pattern.is_match(s),
            _ => true,
        }
    }

    fn describe(&self) -> String {
        format!("{}({})", self.name(), self.pattern.as_str())
    }
}

// ============================================================================
// RECENCY RULE
// ============================================================================

/// Some device `last_access` or some authenticator `last_used` is at or
/// after the threshold (epoch milliseconds)
pub struct RecentActivity {
    threshold_ms: i64,
}

impl RecentActivity {
    pub fn new(threshold_ms: i64) -> Self {
        RecentActivity { threshold_ms }
    }

    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }
}

impl DocumentPredicate for RecentActivity {
    fn name(&self) -> &'static str {
        "recent_activity"
    }

    fn evaluate(&self, doc: &UserDocument) -> bool {
        let device_recent = doc
            .devices()
            .iter()
            .filter_map(|d| d.last_access.as_ref())
            .any(|v| number_gte(v, self.threshold_ms));

        device_recent
            || doc
                .authenticators()
                .iter()
                .filter_map(|a| a.last_used.as_ref())
                .any(|v| number_gte(v, self.threshold_ms))
    }

    fn describe(&self) -> String {
        format!("{}(>= {})", self.name(), self.threshold_ms)
    }
}

// ============================================================================
// COMPOSITION
// ============================================================================

/// Logical AND over a list of predicates
#[derive(Default)]
pub struct PredicateSet {
    predicates: Vec<Box<dyn DocumentPredicate>>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<P: DocumentPredicate + 'static>(mut self, predicate: P) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Rules of the counting path: non-empty `devices` with a valid element
    pub fn valid_device_users() -> Self {
        PredicateSet::new()
            .with(NonEmptyArray::new(ArrayField::Devices))
            .with(HasValidDevice)
    }

    /// Rules of the extraction path
    ///
    /// Every pattern becomes its own exclusion, so all of them apply.
    pub fn active_users<S: AsRef<str>>(threshold_ms: i64, exclude_patterns: &[S]) -> Result<Self> {
        let mut set = PredicateSet::new().with(UserIdPresent);
        for pattern in exclude_patterns {
            set = set.with(UserIdExclusion::new(pattern.as_ref())?);
        }
        Ok(set.with(RecentActivity::new(threshold_ms)))
    }

    /// First rule that rejects the document, if any
    pub fn first_rejection(&self, doc: &UserDocument) -> Option<&dyn DocumentPredicate> {
        self.predicates
            .iter()
            .find(|p| !p.evaluate(doc))
            .map(|p| p.as_ref())
    }

    pub fn admits(&self, doc: &UserDocument) -> bool {
        self.first_rejection(doc).is_none()
    }
}

impl fmt::Debug for PredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.predicates.iter().map(|p| p.describe()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(value: Value) -> UserDocument {
        UserDocument::from_value(&value)
    }

    fn default_exclusions() -> Vec<&'static str> {
        vec![EPHEMERAL_USER_ID_PATTERN, NUMERIC_USER_ID_PATTERN]
    }

    // ========== Counting path ==========

    #[test]
    fn test_non_empty_array_rejects_absent_and_empty() {
        let rule = NonEmptyArray::new(ArrayField::Devices);
        assert!(!rule.evaluate(&doc(json!({"user_id": "u1"}))));
        assert!(!rule.evaluate(&doc(json!({"devices": []}))));
        assert!(!rule.evaluate(&doc(json!({"devices": null}))));
        assert!(!rule.evaluate(&doc(json!({"devices": {"device_id": "d1"}}))));
        assert!(rule.evaluate(&doc(json!({"devices": [{}]}))));
    }

    #[test]
    fn test_valid_device_needs_all_fields_on_one_element() {
        let split = doc(json!({"devices": [
            {"device_id": "d1", "created": 1},
            {"last_access": 2}
        ]}));
        assert!(!HasValidDevice.evaluate(&split));

        let mixed = doc(json!({"devices": [
            {"device_id": "d1"},
            {"device_id": "d2", "created": 1, "last_access": 2}
        ]}));
        assert!(HasValidDevice.evaluate(&mixed));
    }

    #[test]
    fn test_valid_device_accepts_null_values() {
        let nulls = doc(json!({"devices": [
            {"device_id": null, "created": null, "last_access": null}
        ]}));
        assert!(PredicateSet::valid_device_users().admits(&nulls));
    }

    #[test]
    fn test_counting_rejection_reason() {
        let set = PredicateSet::valid_device_users();
        let empty = doc(json!({"devices": []}));
        assert_eq!(set.first_rejection(&empty).unwrap().name(), "non_empty_array");

        let invalid = doc(json!({"devices": [{"device_id": "d1"}]}));
        assert_eq!(set.first_rejection(&invalid).unwrap().name(), "valid_device");
    }

    // ========== Identifier rules ==========

    #[test]
    fn test_user_id_present() {
        assert!(!UserIdPresent.evaluate(&doc(json!({}))));
        assert!(!UserIdPresent.evaluate(&doc(json!({"user_id": null}))));
        assert!(UserIdPresent.evaluate(&doc(json!({"user_id": ""}))));
        assert!(UserIdPresent.evaluate(&doc(json!({"user_id": 42}))));
    }

    #[test]
    fn test_ephemeral_exclusion() {
        let rule = UserIdExclusion::new(EPHEMERAL_USER_ID_PATTERN).unwrap();
        assert!(!rule.evaluate(&doc(json!({"user_id": "eph.abc"}))));
        assert!(rule.evaluate(&doc(json!({"user_id": "ephemeral"}))));
        assert!(rule.evaluate(&doc(json!({"user_id": "x.eph.abc"}))));
    }

    #[test]
    fn test_numeric_18_exclusion() {
        let rule = UserIdExclusion::new(NUMERIC_USER_ID_PATTERN).unwrap();
        assert!(!rule.evaluate(&doc(json!({"user_id": "123456789012345678"}))));
        assert!(rule.evaluate(&doc(json!({"user_id": "12345678901234567"}))));
        assert!(rule.evaluate(&doc(json!({"user_id": "1234567890123456789"}))));
        assert!(rule.evaluate(&doc(json!({"user_id": "12345678901234567a"}))));
        // numbers are not text
        assert!(rule.evaluate(&doc(json!({"user_id": 123456789012345678_i64}))));
    }

    #[test]
    fn test_compile_pattern_reuses_cached_regex() {
        let first = compile_pattern(r"^svc-[a-z]+$").unwrap();
        let second = compile_pattern(r"^svc-[a-z]+$").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(PATTERN_CACHE.lock().contains_key(r"^svc-[a-z]+$"));

        let default = compile_pattern(EPHEMERAL_USER_ID_PATTERN).unwrap();
        assert!(default.is_match("eph.x"));
    }

    #[test]
    fn test_invalid_pattern_is_not_cached() {
        assert!(compile_pattern("[z-a]").is_err());
        assert!(!PATTERN_CACHE.lock().contains_key("[z-a]"));
    }

    #[test]
    fn test_both_exclusions_apply_independently() {
        let set = PredicateSet::active_users(0, &default_exclusions()).unwrap();
        let recent = json!([{"last_access": 10}]);

        let eph = doc(json!({"user_id": "eph.1", "devices": recent.clone()}));
        let numeric = doc(json!({"user_id": "123456789012345678", "devices": recent.clone()}));
        let normal = doc(json!({"user_id": "alice", "devices": recent}));

        assert_eq!(set.first_rejection(&eph).unwrap().describe(), "user_id_exclusion(^eph\\.)");
        assert_eq!(
            set.first_rejection(&numeric).unwrap().describe(),
            "user_id_exclusion(^[0-9]{18}$)"
        );
        assert!(set.admits(&normal));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = PredicateSet::active_users(0, &["(unclosed"]).unwrap_err();
        match err {
            AuditError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // ========== Recency ==========

    #[test]
    fn test_recent_activity_from_either_array() {
        let rule = RecentActivity::new(1000);
        assert!(rule.evaluate(&doc(json!({"devices": [{"last_access": 1000}]}))));
        assert!(rule.evaluate(&doc(json!({"authenticators": [{"last_used": 5000}]}))));
        assert!(rule.evaluate(&doc(json!({
            "devices": [{"last_access": 1}],
            "authenticators": [{"last_used": 1}, {"last_used": 2000}]
        }))));
        assert!(!rule.evaluate(&doc(json!({
            "devices": [{"last_access": 999}],
            "authenticators": [{"last_used": 999}]
        }))));
        assert!(!rule.evaluate(&doc(json!({"devices": [{"last_access": "99999"}]}))));
        assert!(!rule.evaluate(&doc(json!({}))));
    }

    #[test]
    fn test_active_users_rejects_missing_user_id_first() {
        let set = PredicateSet::active_users(0, &default_exclusions()).unwrap();
        assert_eq!(set.len(), 4);
        let anonymous = doc(json!({"devices": [{"last_access": 1}]}));
        assert_eq!(set.first_rejection(&anonymous).unwrap().name(), "user_id_present");
    }

    #[test]
    fn test_empty_set_admits_everything() {
        let set = PredicateSet::new();
        assert!(set.is_empty());
        assert!(set.admits(&doc(json!(null))));
    }

    #[test]
    fn test_debug_lists_rules() {
        let set = PredicateSet::active_users(5, &[EPHEMERAL_USER_ID_PATTERN]).unwrap();
        let text = format!("{set:?}");
        assert!(text.contains("user_id_present"));
        assert!(text.contains("recent_activity(>= 5)"));
    }

    proptest! {
        #[test]
        fn prop_any_valid_device_admits(
            invalid_before in 0usize..4,
            invalid_after in 0usize..4,
        ) {
            let mut devices = vec![json!({"device_id": "x"}); invalid_before];
            devices.push(json!({"device_id": null, "created": 0, "last_access": "?"}));
            devices.extend(vec![json!({"created": 1}); invalid_after]);
            let d = doc(json!({"devices": devices}));
            prop_assert!(PredicateSet::valid_device_users().admits(&d));
        }

        #[test]
        fn prop_no_devices_rejects(user_id in "[a-z0-9.]{0,20}") {
            let d = doc(json!({"user_id": user_id, "devices": []}));
            prop_assert!(!PredicateSet::valid_device_users().admits(&d));
        }
    }
}
