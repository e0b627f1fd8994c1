pub mod identifier;
pub mod time_utils;

pub use identifier::{is_valid_identifier, validate_identifier};
