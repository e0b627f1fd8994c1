//! MySQL row to JSON decoding.
//!
//! Remote rows are loosely typed: the reader hands the transformers plain
//! JSON values and leaves interpretation to them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use serde_json::{json, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use records_sync_core::errors::{RemoteError, Result};
use records_sync_core::remote::RemoteRow;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIME_FORMAT: &str = "%H:%M:%S";

/// How a MySQL column is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Signed,
    Unsigned,
    Float,
    /// Exact numerics stay text so no precision is lost.
    Decimal,
    Date,
    DateTime,
    Time,
    Json,
    Text,
    Binary,
    Other,
}

impl ColumnKind {
    /// Classifies a MySQL type name as reported by the driver.
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        let base = upper.split_whitespace().next().unwrap_or_default();
        let unsigned = upper.contains("UNSIGNED");

        match base {
            "BOOLEAN" | "BOOL" => ColumnKind::Boolean,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" if unsigned => {
                ColumnKind::Unsigned
            }
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
                ColumnKind::Signed
            }
            "BIT" => ColumnKind::Unsigned,
            "FLOAT" | "DOUBLE" | "REAL" => ColumnKind::Float,
            "DECIMAL" | "NUMERIC" => ColumnKind::Decimal,
            "DATE" => ColumnKind::Date,
            "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
            "TIME" => ColumnKind::Time,
            "JSON" => ColumnKind::Json,
            "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => ColumnKind::Text,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                ColumnKind::Binary
            }
            _ => ColumnKind::Other,
        }
    }
}

fn text_or_bytes(row: &MySqlRow, i: usize) -> Option<Value> {
    row.try_get_unchecked::<String, _>(i)
        .map(|v| json!(v))
        .or_else(|_| {
            row.try_get_unchecked::<Vec<u8>, _>(i)
                .map(|bytes| json!(String::from_utf8_lossy(&bytes).to_string()))
        })
        .ok()
}

fn decode_column(row: &MySqlRow, i: usize, kind: ColumnKind) -> Option<Value> {
    match kind {
        ColumnKind::Boolean => row
            .try_get_unchecked::<bool, _>(i)
            .map(|v| json!(v))
            .ok(),
        ColumnKind::Signed => row.try_get_unchecked::<i64, _>(i).map(|v| json!(v)).ok(),
        ColumnKind::Unsigned => row.try_get_unchecked::<u64, _>(i).map(|v| json!(v)).ok(),
        ColumnKind::Float => row
            .try_get_unchecked::<f64, _>(i)
            .map(|v| json!(v))
            .or_else(|_| row.try_get_unchecked::<f32, _>(i).map(|v| json!(v)))
            .ok(),
        ColumnKind::Decimal | ColumnKind::Text | ColumnKind::Binary | ColumnKind::Other => {
            text_or_bytes(row, i)
        }
        ColumnKind::Date => row
            .try_get_unchecked::<NaiveDate, _>(i)
            .map(|d| json!(d.format(DATE_FORMAT).to_string()))
            .ok(),
        ColumnKind::DateTime => row
            .try_get_unchecked::<NaiveDateTime, _>(i)
            .map(|dt| json!(dt.format(DATETIME_FORMAT).to_string()))
            .ok(),
        ColumnKind::Time => row
            .try_get_unchecked::<NaiveTime, _>(i)
            .map(|t| json!(t.format(TIME_FORMAT).to_string()))
            .ok(),
        ColumnKind::Json => text_or_bytes(row, i).map(|v| match v {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            other => other,
        }),
    }
}

/// Converts one MySQL row to a `RemoteRow`, in column order.
///
/// Values the driver cannot decode (zero dates, out-of-range times) become
/// null.
pub fn row_to_remote(row: &MySqlRow) -> Result<RemoteRow> {
    let mut remote = RemoteRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let raw = row
            .try_get_raw(i)
            .map_err(|e| RemoteError::Decode(format!("column '{}': {}", name, e)))?;
        if raw.is_null() {
            remote.insert(name, Value::Null);
            continue;
        }

        let type_name = column.type_info().name();
        let kind = ColumnKind::from_type_name(type_name);
        let value = decode_column(row, i, kind).unwrap_or_else(|| {
            debug!(
                "Column '{}' ({}) could not be decoded; using null",
                name, type_name
            );
            Value::Null
        });
        remote.insert(name, value);
    }
    Ok(remote)
}
