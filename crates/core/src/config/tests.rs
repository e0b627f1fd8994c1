use super::*;
use crate::errors::{Error, ValidationError};
use serde_json::json;

#[test]
fn test_parses_full_config() {
    let config = SyncConfig::from_json(&json!({
        "range_limit": 250,
        "primary_key": "CourseID",
        "local_key": ["course_code"],
        "field_map": {"CourseID": "course_code", "Title": "title"},
        "skip_columns": ["LegacyFlag"],
        "casts": {"credit_units": "float", "created_at": "datetime"},
        "defaults": {"is_active": 1},
        "on_failed_window": "skip_forward"
    }))
    .unwrap();

    assert_eq!(config.range_limit, Some(250));
    assert_eq!(config.primary_key.as_deref(), Some("CourseID"));
    assert_eq!(config.local_name("Title"), "title");
    assert_eq!(config.local_name("Other"), "Other");
    assert!(config.is_skipped("LegacyFlag"));
    assert_eq!(config.casts.get("created_at"), Some(&ColumnCast::DateTime));
    assert_eq!(config.on_failed_window, Some(FailedWindowPolicy::SkipForward));
    assert!(config.validate().is_ok());
}

#[test]
fn test_null_config_is_default() {
    let config = SyncConfig::from_json(&serde_json::Value::Null).unwrap();
    assert_eq!(config, SyncConfig::default());
    assert_eq!(config.effective_range_limit(1000), 1000);
    assert_eq!(config.to_json().unwrap(), json!({}));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = SyncConfig::from_json(&json!({"primary_keys": "id"})).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::InvalidInput(_))));
}

#[test]
fn test_range_limit_bounds() {
    assert!(validate_range_limit(1).is_ok());
    assert!(validate_range_limit(10_000).is_ok());
    assert!(matches!(
        validate_range_limit(0),
        Err(Error::Validation(ValidationError::RangeLimitOutOfBounds { value: 0, .. }))
    ));
    assert!(validate_range_limit(10_001).is_err());

    let config = SyncConfig {
        range_limit: Some(-5),
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_unsafe_identifiers() {
    let config = SyncConfig {
        primary_key: Some("id; DROP TABLE students".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(Error::Validation(ValidationError::InvalidIdentifier(_)))
    ));

    let mut config = SyncConfig::default();
    config
        .field_map
        .insert("name".to_string(), "full name".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_cast_on_skipped_column() {
    let mut config = SyncConfig::default();
    config.skip_columns.insert("score".to_string());
    config.casts.insert("score".to_string(), ColumnCast::Integer);
    assert!(config.validate().is_err());
}

#[test]
fn test_rejects_empty_local_key() {
    let config = SyncConfig {
        local_key: Some(vec![]),
        ..Default::default()
    };
    assert!(config.validate().is_err());
}
