//! SQL identifier validation.
//!
//! Table and column names reach SQL text through `format!` in both the local
//! store and the remote reader, so every name is checked here first.

use regex::Regex;
use std::sync::LazyLock;

use crate::errors::{Error, Result, ValidationError};

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid identifier regex"));

/// Returns true when `name` is a plain SQL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Validates `name` and returns it unchanged.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(Error::Validation(ValidationError::InvalidIdentifier(
            name.to_string(),
        )))
    }
}
