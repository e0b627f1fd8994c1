//! Utility functions for SQLite storage operations.

use chrono::{DateTime, SecondsFormat, Utc};
use records_sync_core::errors::{DatabaseError, Error, Result};

/// Maximum number of `key, value` pairs passed to one `json_object(...)` call.
///
/// SQLite caps function arguments at 127 by default (SQLITE_MAX_FUNCTION_ARG),
/// so wider rows are read in several chunks.
pub const JSON_OBJECT_MAX_PAIRS: usize = 60;

/// Chunk a column list for `json_object` reads.
pub fn chunk_for_json_object<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(JSON_OBJECT_MAX_PAIRS)
}

/// Quotes a validated identifier for SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Timestamps are stored as RFC 3339 text with microseconds, which sorts
/// lexicographically in time order.
pub fn to_db_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_db_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            Error::Database(DatabaseError::Internal(format!(
                "Invalid stored timestamp '{}': {}",
                value, e
            )))
        })
}

pub fn parse_opt_db_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value.as_deref().map(parse_db_timestamp).transpose()
}
