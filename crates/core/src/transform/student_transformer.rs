//! Transformation rules for `students`.

use serde_json::Value;

use super::coerce::{apply_casts_and_defaults, apply_field_overrides, as_i64, non_empty_text};
use super::transform_model::{LocalRow, TransformError};
use super::transform_traits::RowTransformer;
use crate::config::SyncConfig;
use crate::remote::RemoteRow;
use crate::utils::time_utils::{parse_flexible_datetime, LOCAL_DATETIME_FORMAT};

pub const STUDENTS_TABLE: &str = "students";

#[derive(Debug, Default)]
pub struct StudentTransformer;

impl StudentTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl RowTransformer for StudentTransformer {
    fn remote_key_column(&self) -> &str {
        "id"
    }

    fn natural_key(&self) -> Vec<String> {
        vec!["id".to_string()]
    }

    fn transform(&self, row: &RemoteRow, config: &SyncConfig) -> Result<LocalRow, TransformError> {
        let id = match row.get_any(&["id", "ID"]) {
            Some(value) => as_i64(value)
                .map_err(|reason| TransformError::new("id", reason))?
                .ok_or_else(|| TransformError::missing("id"))?,
            None => return Err(TransformError::missing("id")),
        };

        let text = |columns: &[&str]| {
            non_empty_text(row.get_any(columns))
                .map(Value::String)
                .unwrap_or(Value::Null)
        };

        let mut local = LocalRow::new();
        local.insert("id", Value::from(id));
        local.insert("student_id", text(&["student_id", "StudentID"]));
        local.insert("name", text(&["name", "FullName"]));
        local.insert("email", text(&["email", "Email"]));

        // Absent created_at is left to the local column default.
        if let Some(raw) = non_empty_text(row.get("created_at")) {
            let parsed = parse_flexible_datetime(&raw).ok_or_else(|| {
                TransformError::new("created_at", format!("'{}' is not a valid datetime", raw))
            })?;
            local.insert(
                "created_at",
                Value::String(parsed.format(LOCAL_DATETIME_FORMAT).to_string()),
            );
        }

        apply_field_overrides(&mut local, row, config);
        apply_casts_and_defaults(&mut local, config)?;
        Ok(local)
    }
}
