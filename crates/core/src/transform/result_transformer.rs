//! Transformation rules for `acad_results`.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use serde_json::Value;

use super::coerce::{
    apply_casts_and_defaults, apply_field_overrides, as_f64, as_i64, non_empty_text,
    opt_f64_value, opt_i64_value, opt_text_value, truncate_chars,
};
use super::transform_model::{LocalRow, TransformError};
use super::transform_traits::RowTransformer;
use crate::config::SyncConfig;
use crate::remote::RemoteRow;

pub const RESULTS_TABLE: &str = "acad_results";

const MAX_REGNO_CHARS: usize = 85;
const MAX_COURSEID_CHARS: usize = 25;
const MAX_SHORT_TEXT_CHARS: usize = 25;

static ACADEMIC_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{4}$").expect("valid academic year regex"));

/// Student course results keyed by `(regno, courseid)`.
///
/// The remote `ID` only drives windowing; the local table generates its own
/// ids, so it is never copied.
#[derive(Debug, Default)]
pub struct ResultTransformer;

impl ResultTransformer {
    pub fn new() -> Self {
        Self
    }
}

fn int_field(row: &RemoteRow, field: &str) -> Result<Option<i64>, TransformError> {
    row.get(field)
        .map(as_i64)
        .transpose()
        .map(Option::flatten)
        .map_err(|reason| TransformError::new(field, reason))
}

fn float_field(row: &RemoteRow, field: &str) -> Result<Option<f64>, TransformError> {
    row.get(field)
        .map(as_f64)
        .transpose()
        .map(Option::flatten)
        .map_err(|reason| TransformError::new(field, reason))
}

fn short_text(row: &RemoteRow, field: &str) -> Option<String> {
    non_empty_text(row.get(field)).map(|s| truncate_chars(&s, MAX_SHORT_TEXT_CHARS))
}

impl RowTransformer for ResultTransformer {
    fn remote_key_column(&self) -> &str {
        "ID"
    }

    fn natural_key(&self) -> Vec<String> {
        vec!["regno".to_string(), "courseid".to_string()]
    }

    fn transform(&self, row: &RemoteRow, config: &SyncConfig) -> Result<LocalRow, TransformError> {
        let regno =
            non_empty_text(row.get("regno")).ok_or_else(|| TransformError::missing("regno"))?;
        let courseid =
            non_empty_text(row.get("courseid")).ok_or_else(|| TransformError::missing("courseid"))?;

        let regno_len = regno.chars().count();
        if regno_len > MAX_REGNO_CHARS {
            return Err(TransformError::new(
                "regno",
                format!("exceeds {} characters ({})", MAX_REGNO_CHARS, regno_len),
            ));
        }
        let courseid_len = courseid.chars().count();
        if courseid_len > MAX_COURSEID_CHARS {
            return Err(TransformError::new(
                "courseid",
                format!("exceeds {} characters ({})", MAX_COURSEID_CHARS, courseid_len),
            ));
        }

        let semester = match int_field(row, "semester")? {
            Some(s @ 1..=3) => s,
            Some(other) => {
                return Err(TransformError::new(
                    "semester",
                    format!("must be 1, 2 or 3, got {}", other),
                ))
            }
            None => return Err(TransformError::missing("semester")),
        };

        let acad = non_empty_text(row.get("acad")).ok_or_else(|| TransformError::missing("acad"))?;
        if !ACADEMIC_YEAR_RE.is_match(&acad) {
            warn!(
                "Result {}/{} has non-standard academic year '{}'",
                regno, courseid, acad
            );
        }

        let score = int_field(row, "score")?.map(|s| s.clamp(0, 100));
        let grade = non_empty_text(row.get("grade"));
        let studyyear = int_field(row, "studyyear")?;
        let gradept = float_field(row, "gradept")?;
        let gpa = float_field(row, "gpa")?;
        let credit_units = float_field(row, "CreditUnits")?;

        if let Some(g) = gpa {
            if !(0.0..=5.0).contains(&g) {
                warn!("Result {}/{} has GPA {} outside 0-5", regno, courseid, g);
            }
        }

        let mut local = LocalRow::new();
        local.insert("regno", Value::String(regno));
        local.insert("courseid", Value::String(courseid));
        local.insert("semester", Value::from(semester));
        local.insert("acad", Value::String(acad));
        local.insert("studyyear", opt_i64_value(studyyear));
        local.insert("score", opt_i64_value(score));
        local.insert("grade", opt_text_value(grade));
        local.insert("gradept", opt_f64_value(gradept));
        local.insert("gpa", opt_f64_value(gpa));
        local.insert("result_comment", opt_text_value(short_text(row, "result_comment")));
        local.insert("CreditUnits", opt_f64_value(credit_units));
        local.insert("progid", opt_text_value(short_text(row, "progid")));

        apply_field_overrides(&mut local, row, config);
        apply_casts_and_defaults(&mut local, config)?;
        Ok(local)
    }
}
