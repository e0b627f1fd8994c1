use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Local datetime format written by the transformers.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local date format written by the transformers.
pub const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Whole seconds elapsed between `started_at` and `finished_at`.
///
/// Returns `None` when the run never started. A clock that went backwards
/// yields zero rather than a negative duration.
pub fn duration_seconds(
    started_at: Option<DateTime<Utc>>,
    finished_at: DateTime<Utc>,
) -> Option<i64> {
    started_at.map(|start| (finished_at - start).num_seconds().max(0))
}

/// Parses the datetime shapes the legacy database emits.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]`, `YYYY-MM-DDTHH:MM:SS` and a
/// bare date (midnight).
pub fn parse_flexible_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, LOCAL_DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a date, accepting a datetime and dropping its time part.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, LOCAL_DATE_FORMAT)
        .ok()
        .or_else(|| parse_flexible_datetime(trimmed).map(|dt| dt.date()))
}
