//! Typed per-run sync configuration stored in `remote_database_syncs.sync_config`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::MAX_RANGE_LIMIT;
use crate::errors::{Error, Result, ValidationError};
use crate::utils::validate_identifier;

/// Target type applied to a local column before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnCast {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    #[serde(alias = "date_time")]
    DateTime,
}

/// What to do with the window of the most recent failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedWindowPolicy {
    /// Re-read the failed window
    Retry,
    /// Move past the failed window
    SkipForward,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_limit: Option<i64>,
    /// Remote key column used for windowing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Natural key of the local table for tables without built-in rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_key: Option<Vec<String>>,
    /// Remote column -> local column
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub field_map: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub skip_columns: BTreeSet<String>,
    /// Local column -> cast
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub casts: BTreeMap<String, ColumnCast>,
    /// Local column -> value used when the column is absent or null
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_failed_window: Option<FailedWindowPolicy>,
}

impl SyncConfig {
    /// Parses a stored or submitted config blob. `null` yields the default.
    pub fn from_json(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::Validation(ValidationError::InvalidInput(format!(
                "Invalid sync_config: {}",
                e
            )))
        })
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Local column name a remote column maps to.
    pub fn local_name<'a>(&'a self, remote_column: &'a str) -> &'a str {
        self.field_map
            .get(remote_column)
            .map(String::as_str)
            .unwrap_or(remote_column)
    }

    pub fn is_skipped(&self, column: &str) -> bool {
        self.skip_columns.contains(column)
    }

    /// Window size for a run: the explicit value, else `default_limit`.
    pub fn effective_range_limit(&self, default_limit: i64) -> i64 {
        self.range_limit.unwrap_or(default_limit)
    }

    /// Checks identifiers, bounds and cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.range_limit {
            validate_range_limit(limit)?;
        }

        if let Some(pk) = &self.primary_key {
            validate_identifier(pk)?;
        }

        if let Some(keys) = &self.local_key {
            if keys.is_empty() {
                return Err(ValidationError::InvalidInput(
                    "local_key must name at least one column".to_string(),
                )
                .into());
            }
            for key in keys {
                validate_identifier(key)?;
            }
        }

        for (remote, local) in &self.field_map {
            validate_identifier(remote)?;
            validate_identifier(local)?;
        }

        for column in &self.skip_columns {
            validate_identifier(column)?;
        }

        for column in self.casts.keys().chain(self.defaults.keys()) {
            validate_identifier(column)?;
            if self.is_skipped(column) {
                return Err(ValidationError::InvalidInput(format!(
                    "Column '{}' is both skipped and cast or defaulted",
                    column
                ))
                .into());
            }
        }

        Ok(())
    }
}

/// Checks a window size against the accepted bounds.
pub fn validate_range_limit(limit: i64) -> Result<()> {
    if (1..=MAX_RANGE_LIMIT).contains(&limit) {
        Ok(())
    } else {
        Err(ValidationError::RangeLimitOutOfBounds {
            value: limit,
            max: MAX_RANGE_LIMIT,
        }
        .into())
    }
}
