//! Per-run sync configuration.

mod sync_config;

#[cfg(test)]
mod tests;

pub use sync_config::{validate_range_limit, ColumnCast, FailedWindowPolicy, SyncConfig};
