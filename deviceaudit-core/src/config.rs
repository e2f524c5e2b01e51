// deviceaudit-core/src/config.rs
// Pipeline configuration: collection, recency window, user_id exclusions

use crate::error::{AuditError, Result};
use crate::predicate::{compile_pattern, EPHEMERAL_USER_ID_PATTERN, NUMERIC_USER_ID_PATTERN};
use crate::timestamp::DEFAULT_DAYS_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default collection holding user accounts
pub const DEFAULT_COLLECTION: &str = "users";

/// Settings shared by both pipelines
///
/// Missing keys in a config file take their defaults.
///
/// # Examples
///
/// ```rust
/// use deviceaudit_core::PipelineConfig;
///
/// let config = PipelineConfig::default()
///     .with_collection("accounts")
///     .with_days_threshold(30);
/// assert_eq!(config.collection, "accounts");
/// assert_eq!(config.exclude_user_id_patterns.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Collection to scan
    pub collection: String,
    /// Recency window of the extraction pipeline, in days
    pub days_threshold: u32,
    /// Regexes over string `user_id`s; a match on any one excludes the
    /// document from extraction
    pub exclude_user_id_patterns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            collection: DEFAULT_COLLECTION.to_string(),
            days_threshold: DEFAULT_DAYS_THRESHOLD,
            exclude_user_id_patterns: vec![
                EPHEMERAL_USER_ID_PATTERN.to_string(),
                NUMERIC_USER_ID_PATTERN.to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_days_threshold(mut self, days: u32) -> Self {
        self.days_threshold = days;
        self
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_user_id_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Parse a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| AuditError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Check the settings before any document is read
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(AuditError::InvalidConfig(
                "Collection name cannot be empty".to_string(),
            ));
        }
        for pattern in &self.exclude_user_id_patterns {
            compile_pattern(pattern)?;
        }
        Ok(())
    }
}
