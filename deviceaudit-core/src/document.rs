// src/document.rs
//! Typed views over schemaless user-account documents
//!
//! Every optional field is an `Option<Value>`: `None` means the key is
//! absent, `Some(Value::Null)` means the key is present with a null value.
//! The distinction matters because device validity tests presence, not
//! truthiness.

use serde_json::{Map, Value};

/// One entry of a user's `devices` array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRecord {
    pub device_id: Option<Value>,
    /// Epoch milliseconds
    pub created: Option<Value>,
    /// Epoch milliseconds
    pub last_access: Option<Value>,
}

/// One entry of a user's `authenticators` array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthenticatorRecord {
    pub method: Option<Value>,
    pub device_id: Option<Value>,
    /// Epoch milliseconds
    pub last_used: Option<Value>,
    pub status: Option<Value>,
    pub provider_config_id: Option<Value>,
    pub expired: Option<Value>,
}

/// Snapshot of one stored user document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDocument {
    pub user_id: Option<Value>,
    /// `None` when the key is absent or does not hold an array
    pub devices: Option<Vec<DeviceRecord>>,
    /// `None` when the key is absent or does not hold an array
    pub authenticators: Option<Vec<AuthenticatorRecord>>,
}

/// The two nested arrays a user document may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayField {
    Devices,
    Authenticators,
}

impl ArrayField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrayField::Devices => "devices",
            ArrayField::Authenticators => "authenticators",
        }
    }
}

fn field(map: Option<&Map<String, Value>>, key: &str) -> Option<Value> {
    map.and_then(|m| m.get(key)).cloned()
}

impl DeviceRecord {
    /// Read a device from any JSON value
    ///
    /// A non-object element yields a record with every field absent.
    pub fn from_value(value: &Value) -> Self {
        let map = value.as_object();
        DeviceRecord {
            device_id: field(map, "device_id"),
            created: field(map, "created"),
            last_access: field(map, "last_access"),
        }
    }

    /// `device_id`, `created` and `last_access` are all present (any value,
    /// null included)
    pub fn is_valid(&self) -> bool {
        self.device_id.is_some() && self.created.is_some() && self.last_access.is_some()
    }
}

impl AuthenticatorRecord {
    /// Read an authenticator from any JSON value
    ///
    /// A non-object element yields a record with every field absent.
    pub fn from_value(value: &Value) -> Self {
        let map = value.as_object();
        AuthenticatorRecord {
            method: field(map, "method"),
            device_id: field(map, "device_id"),
            last_used: field(map, "last_used"),
            status: field(map, "status"),
            provider_config_id: field(map, "provider_config_id"),
            expired: field(map, "expired"),
        }
    }
}

impl UserDocument {
    /// Build a typed snapshot from a raw stored document
    ///
    /// Never fails: missing or mistyped fields are recorded as absent.
    pub fn from_value(value: &Value) -> Self {
        let map = value.as_object();
        let devices = map
            .and_then(|m| m.get("devices"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(DeviceRecord::from_value).collect());
        let authenticators = map
            .and_then(|m| m.get("authenticators"))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(AuthenticatorRecord::from_value).collect());

        UserDocument {
            user_id: field(map, "user_id"),
            devices,
            authenticators,
        }
    }

    /// Parse a single JSON document
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Devices as a slice; absent reads as empty
    pub fn devices(&self) -> &[DeviceRecord] {
        self.devices.as_deref().unwrap_or(&[])
    }

    /// Authenticators as a slice; absent reads as empty
    pub fn authenticators(&self) -> &[AuthenticatorRecord] {
        self.authenticators.as_deref().unwrap_or(&[])
    }

    /// Element count of a nested array, `None` if the array is absent
    pub fn array_len(&self, field: ArrayField) -> Option<usize> {
        match field {
            ArrayField::Devices => self.devices.as_ref().map(Vec::len),
            ArrayField::Authenticators => self.authenticators.as_ref().map(Vec::len),
        }
    }

    /// `user_id` as text, for log messages
    pub fn user_id_label(&self) -> String {
        match &self.user_id {
            None => "<absent>".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_present_null_is_distinct_from_absent() {
        let device = DeviceRecord::from_value(&json!({"device_id": null, "created": 1}));
        assert_eq!(device.device_id, Some(Value::Null));
        assert_eq!(device.created, Some(json!(1)));
        assert_eq!(device.last_access, None);
        assert!(!device.is_valid());
    }

    #[test]
    fn test_device_validity_is_presence_based() {
        let device = DeviceRecord::from_value(&json!({
            "device_id": null,
            "created": false,
            "last_access": ""
        }));
        assert!(device.is_valid());
    }

    #[test]
    fn test_non_object_elements_have_no_fields() {
        let doc = UserDocument::from_value(&json!({
            "user_id": "u1",
            "devices": ["phone", 7, null],
            "authenticators": [true]
        }));
        assert_eq!(doc.devices().len(), 3);
        assert!(doc.devices().iter().all(|d| *d == DeviceRecord::default()));
        assert_eq!(doc.authenticators()[0], AuthenticatorRecord::default());
    }

    #[test]
    fn test_non_array_fields_are_absent() {
        let doc = UserDocument::from_value(&json!({
            "user_id": "u1",
            "devices": {"device_id": "d1"},
            "authenticators": "none"
        }));
        assert_eq!(doc.array_len(ArrayField::Devices), None);
        assert_eq!(doc.array_len(ArrayField::Authenticators), None);
        assert!(doc.devices().is_empty());
    }

    #[test]
    fn test_empty_arrays_are_present() {
        let doc = UserDocument::from_json(r#"{"devices": [], "authenticators": []}"#).unwrap();
        assert_eq!(doc.array_len(ArrayField::Devices), Some(0));
        assert_eq!(doc.array_len(ArrayField::Authenticators), Some(0));
        assert_eq!(doc.user_id, None);
        assert_eq!(doc.user_id_label(), "<absent>");
    }

    #[test]
    fn test_non_object_document() {
        let doc = UserDocument::from_value(&json!([1, 2, 3]));
        assert_eq!(doc, UserDocument::default());
    }

    #[test]
    fn test_authenticator_fields() {
        let auth = AuthenticatorRecord::from_value(&json!({
            "method": "totp",
            "device_id": "d9",
            "last_used": 5000,
            "status": "active",
            "provider_config_id": "cfg",
            "expired": true,
            "unrelated": 1
        }));
        assert_eq!(auth.method, Some(json!("totp")));
        assert_eq!(auth.device_id, Some(json!("d9")));
        assert_eq!(auth.last_used, Some(json!(5000)));
        assert_eq!(auth.status, Some(json!("active")));
        assert_eq!(auth.provider_config_id, Some(json!("cfg")));
        assert_eq!(auth.expired, Some(json!(true)));
    }
}
