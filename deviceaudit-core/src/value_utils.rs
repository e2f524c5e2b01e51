//! Value utility functions shared across modules
//!
//! Documents arrive schemaless, so a field may hold any JSON type. These
//! helpers give the rest of the crate one consistent reading of "present",
//! "truthy" and "numeric timestamp".

use serde_json::Value;
use std::cmp::Ordering;

/// Truthiness of a JSON value, used by fallback chains
///
/// `null`, `false`, numeric zero, the empty string, the empty array and the
/// empty object are falsy; everything else is truthy.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use deviceaudit_core::value_utils::is_truthy;
///
/// assert!(is_truthy(&json!("d1")));
/// assert!(!is_truthy(&json!(0)));
/// assert!(!is_truthy(&json!(null)));
/// ```
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(arr) => !arr.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// First candidate that is present and truthy
///
/// Candidates are evaluated left to right; `None` (absent) and falsy
/// values are skipped.
pub fn first_truthy<'a, I>(candidates: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|value| is_truthy(value))
}

/// Epoch-millisecond reading of a value, if it is a strictly positive number
///
/// Booleans and numeric strings are not timestamps.
pub fn positive_millis(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|ms| *ms > 0.0),
        _ => None,
    }
}

/// Numeric comparison against a threshold, ignoring non-numeric values
///
/// Mirrors document-store type bracketing: a string never satisfies a
/// numeric `>=`.
pub fn number_gte(value: &Value, threshold: i64) -> bool {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i >= threshold
            } else if n.is_u64() {
                // only reachable above i64::MAX
                true
            } else {
                n.as_f64().is_some_and(|f| f >= threshold as f64)
            }
        }
        _ => false,
    }
}

/// Render a value as a plain text cell
///
/// Strings are emitted without quotes, `null` as the empty string, anything
/// else with its JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Descending comparison of two optional timestamps
///
/// Present values come first, larger before smaller; absent values last.
pub fn compare_desc_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
