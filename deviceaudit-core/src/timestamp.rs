//! Epoch-millisecond timestamp handling
//!
//! Normalization turns stored millisecond timestamps into local-time text
//! and never fails: values that cannot be converted fall back to their raw
//! text, non-timestamps to the empty string.

use chrono::{DateTime, Datelike, Duration, Local, TimeZone};
use serde_json::Value;

/// Output format of normalized timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Years that fit the four-digit `%Y` field
const FORMATTABLE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Default recency window in days
pub const DEFAULT_DAYS_THRESHOLD: u32 = 365;

/// Format an epoch-millisecond value as local time
///
/// - absent, non-numeric, zero or negative: `""`
/// - convertible number: `YYYY-MM-DD HH:MM:SS` in the local time zone
/// - number outside years 1..=9999: its raw JSON text
pub fn normalize_timestamp(value: Option<&Value>) -> String {
    let Some(Value::Number(n)) = value else {
        return String::new();
    };
    let Some(ms) = n.as_f64() else {
        return String::new();
    };
    if ms <= 0.0 {
        return String::new();
    }

    match millis_to_local(ms) {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => n.to_string(),
    }
}

fn millis_to_local(ms: f64) -> Option<DateTime<Local>> {
    if !ms.is_finite() || ms >= i64::MAX as f64 {
        return None;
    }
    Local
        .timestamp_millis_opt(ms.trunc() as i64)
        .single()
        .filter(|dt| FORMATTABLE_YEARS.contains(&dt.year()))
}

/// Lower bound (inclusive) of the recency window, in epoch milliseconds
///
/// Saturates instead of panicking on absurd day counts.
pub fn threshold_millis(now: DateTime<Local>, days: u32) -> i64 {
    match Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d)) {
        Some(start) => start.timestamp_millis(),
        None => i64::MIN,
    }
}
