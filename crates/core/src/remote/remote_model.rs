//! Remote source domain models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row read from the remote source, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRow(Map<String, Value>);

impl RemoteRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    /// Looks a column up by exact name, then case-insensitively.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).or_else(|| {
            self.0
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    /// First non-null value among `columns`.
    pub fn get_any(&self, columns: &[&str]) -> Option<&Value> {
        columns
            .iter()
            .filter_map(|c| self.get(c))
            .find(|v| !v.is_null())
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

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for RemoteRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Result of a remote connection test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConnectionStatus {
    pub success: bool,
    pub message: String,
    pub database: Option<String>,
    pub server_version: Option<String>,
}

impl RemoteConnectionStatus {
    pub fn connected(database: Option<String>, server_version: Option<String>) -> Self {
        Self {
            success: true,
            message: "Remote database connection successful".to_string(),
            database,
            server_version,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            database: None,
            server_version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_falls_back_to_case_insensitive() {
        let mut row = RemoteRow::new();
        row.insert("ID", json!(7));
        row.insert("FullName", json!("Ada Okello"));
        row.insert("email", Value::Null);

        assert_eq!(row.get("ID"), Some(&json!(7)));
        assert_eq!(row.get("id"), Some(&json!(7)));
        assert_eq!(row.get("fullname"), Some(&json!("Ada Okello")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_get_any_skips_nulls() {
        let mut row = RemoteRow::new();
        row.insert("email", Value::Null);
        row.insert("Email", json!("a@b.ug"));

        assert_eq!(row.get_any(&["email", "Email"]), Some(&json!("a@b.ug")));
        assert_eq!(row.get_any(&["phone"]), None);
    }

    #[test]
    fn test_serializes_as_plain_object_in_order() {
        let mut row = RemoteRow::new();
        row.insert("b", json!(1));
        row.insert("a", json!(2));
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":1,"a":2}"#);
    }
}
