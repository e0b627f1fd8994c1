//! Value coercion shared by the transformers.

use serde_json::{Number, Value};

use super::transform_model::{LocalRow, TransformError};
use crate::config::{ColumnCast, SyncConfig};
use crate::remote::RemoteRow;
use crate::utils::time_utils::{
    parse_flexible_date, parse_flexible_datetime, LOCAL_DATETIME_FORMAT, LOCAL_DATE_FORMAT,
};

/// Trimmed text form of a scalar. `None` for null, arrays and objects.
pub fn as_trimmed_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

/// Non-empty trimmed text, or `None`.
pub fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value.and_then(as_trimmed_text).filter(|s| !s.is_empty())
}

/// Integer form of a value. Fractions are truncated toward zero; null and
/// blank text are `None`.
pub fn as_i64(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| Some(f.trunc() as i64))
                .ok_or_else(|| format!("{} is not a valid integer", n)),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a valid integer", trimmed))
        }
        _ => Err("expected a scalar value".to_string()),
    }
}

/// Float form of a value; null and blank text are `None`.
pub fn as_f64(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{} is not a valid number", n)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Some)
                .ok_or_else(|| format!("'{}' is not a valid number", trimmed))
        }
        _ => Err("expected a scalar value".to_string()),
    }
}

pub fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

pub fn opt_i64_value(v: Option<i64>) -> Value {
    v.map(Value::from).unwrap_or(Value::Null)
}

pub fn opt_f64_value(v: Option<f64>) -> Value {
    v.map(float_value).unwrap_or(Value::Null)
}

pub fn opt_text_value(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

/// Cuts `s` to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Applies a configured cast. Null stays null.
pub fn cast_value(value: &Value, cast: ColumnCast) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match cast {
        ColumnCast::Integer => as_i64(value).map(opt_i64_value),
        ColumnCast::Float => as_f64(value).map(opt_f64_value),
        ColumnCast::Text => Ok(match value {
            Value::String(s) => Value::String(s.clone()),
            Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
            other => opt_text_value(as_trimmed_text(other)),
        }),
        ColumnCast::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
                "0" | "false" | "no" | "n" | "off" | "" => Ok(Value::Bool(false)),
                other => Err(format!("'{}' is not a valid boolean", other)),
            },
            _ => Err("expected a scalar value".to_string()),
        },
        ColumnCast::Date => {
            let text = as_trimmed_text(value).unwrap_or_default();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            parse_flexible_date(&text)
                .map(|d| Value::String(d.format(LOCAL_DATE_FORMAT).to_string()))
                .ok_or_else(|| format!("'{}' is not a valid date", text))
        }
        ColumnCast::DateTime => {
            let text = as_trimmed_text(value).unwrap_or_default();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            parse_flexible_datetime(&text)
                .map(|dt| Value::String(dt.format(LOCAL_DATETIME_FORMAT).to_string()))
                .ok_or_else(|| format!("'{}' is not a valid datetime", text))
        }
    }
}

/// Applies `field_map` and `skip_columns` on top of a built-in mapping.
pub fn apply_field_overrides(local: &mut LocalRow, remote: &RemoteRow, config: &SyncConfig) {
    for (remote_column, local_column) in &config.field_map {
        if let Some(value) = remote.get(remote_column) {
            local.insert(local_column.clone(), value.clone());
        }
    }
    for column in &config.skip_columns {
        local.remove(column);
    }
}

/// Applies configured casts, then defaults for absent or null columns.
pub fn apply_casts_and_defaults(
    local: &mut LocalRow,
    config: &SyncConfig,
) -> Result<(), TransformError> {
    for (column, cast) in &config.casts {
        if let Some(value) = local.get(column) {
            let cast = cast_value(value, *cast).map_err(|reason| TransformError::new(column, reason))?;
            local.insert(column.clone(), cast);
        }
    }
    for (column, default) in &config.defaults {
        if local.get(column).is_none_or(Value::is_null) {
            local.insert(column.clone(), default.clone());
        }
    }
    Ok(())
}
