//! MySQL source for Records Sync.
//!
//! Implements `RemoteTableReader` from `records-sync-core` over a lazy sqlx
//! pool. The reader only ever issues `SELECT` statements; every query is
//! bounded by the configured timeout.

pub mod config;
pub mod decode;
pub mod reader;

pub use config::RemoteDbConfig;
pub use reader::MySqlTableReader;
