//! Row transformation models.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Row-level transformation failure. Counted as a failed row, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid field '{field}': {reason}")]
pub struct TransformError {
    pub field: String,
    pub reason: String,
}

impl TransformError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// A row shaped for the local table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalRow(Map<String, Value>);

impl LocalRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.shift_remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Extracts the natural key. Every key column must be present and non-null.
    pub fn key_for(&self, key_columns: &[String]) -> Result<RowKey, TransformError> {
        let mut parts = Vec::with_capacity(key_columns.len());
        for column in key_columns {
            match self.0.get(column) {
                Some(value) if !value.is_null() => parts.push((column.clone(), value.clone())),
                _ => return Err(TransformError::new(column, "natural key column is missing")),
            }
        }
        Ok(RowKey(parts))
    }
}

/// Natural key of a local row as `(column, value)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowKey(Vec<(String, Value)>);

impl RowKey {
    pub fn new(parts: Vec<(String, Value)>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[(String, Value)] {
        &self.0
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::String(s) => write!(f, "{}={}", column, s)?,
                other => write!(f, "{}={}", column, other)?,
            }
        }
        Ok(())
    }
}
