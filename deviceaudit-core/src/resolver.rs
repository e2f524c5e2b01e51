// src/resolver.rs
//! Flattening of expanded pairs into report rows
//!
//! Each output field is resolved on its own through an ordered fallback
//! chain:
//!
//! | field | chain |
//! |---|---|
//! | `uid` | `user_id`, else `""` |
//! | `device_id` | device `device_id`, auth `device_id`, else `""` |
//! | `registered` | device `created`, auth `last_used`, normalized |
//! | `last_access` | device `last_access`, auth `last_used`, `0`, normalized |
//! | `method` / `status` / `provider_config_id` | auth field, else `""` |
//! | `expired` | auth `expired`, else `false` |
//!
//! Chains marked with several sources skip absent and falsy candidates.
//! `registered` falls back to `last_used` because authenticators carry no
//! creation time.

use crate::document::{AuthenticatorRecord, DeviceRecord, UserDocument};
use crate::expansion::ExpandedPair;
use crate::timestamp::normalize_timestamp;
use crate::value_utils::{first_truthy, positive_millis, value_to_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One report row: a single (device, authenticator) pairing of a user
///
/// Field order is the report's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedRecord {
    pub uid: String,
    pub device_id: String,
    pub registered: String,
    pub last_access: String,
    pub method: String,
    pub status: String,
    pub provider_config_id: String,
    pub expired: bool,
}

/// Numeric ordering key, captured before timestamps are formatted
///
/// `None` stands for an absent, non-numeric or non-positive timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SortKey {
    /// Resolved `last_access` source value
    pub last_access_ms: Option<f64>,
    /// Authenticator `last_used`
    pub auth_last_used_ms: Option<f64>,
}

/// A flattened record together with its sort key
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    pub record: FlattenedRecord,
    pub key: SortKey,
}

fn text_or_empty(value: Option<&Value>) -> String {
    value.map(value_to_text).unwrap_or_default()
}

/// Resolve one expanded pair of `doc` into a row
pub fn resolve(
    doc: &UserDocument,
    device: Option<&DeviceRecord>,
    auth: Option<&AuthenticatorRecord>,
) -> ResolvedRow {
    let device_id = device.and_then(|d| d.device_id.as_ref());
    let created = device.and_then(|d| d.created.as_ref());
    let last_access = device.and_then(|d| d.last_access.as_ref());
    let auth_device_id = auth.and_then(|a| a.device_id.as_ref());
    let auth_last_used = auth.and_then(|a| a.last_used.as_ref());

    let zero = Value::from(0);
    let last_access_source = first_truthy([last_access, auth_last_used]).unwrap_or(&zero);

    let record = FlattenedRecord {
        uid: text_or_empty(doc.user_id.as_ref()),
        device_id: text_or_empty(first_truthy([device_id, auth_device_id])),
        registered: normalize_timestamp(first_truthy([created, auth_last_used])),
        last_access: normalize_timestamp(Some(last_access_source)),
        method: text_or_empty(auth.and_then(|a| a.method.as_ref())),
        status: text_or_empty(auth.and_then(|a| a.status.as_ref())),
        provider_config_id: text_or_empty(auth.and_then(|a| a.provider_config_id.as_ref())),
        expired: auth
            .and_then(|a| a.expired.as_ref())
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    let key = SortKey {
        last_access_ms: positive_millis(last_access_source),
        auth_last_used_ms: auth_last_used.and_then(positive_millis),
    };

    ResolvedRow { record, key }
}

/// Resolve an expanded pair (convenience for iterator chains)
pub fn resolve_pair(doc: &UserDocument, pair: ExpandedPair<'_>) -> ResolvedRow {
    resolve(doc, pair.0, pair.1)
}
