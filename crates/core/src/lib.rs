//! Records Sync Core - domain entities, services, and traits.
//!
//! This crate holds the incremental remote-to-local table sync logic. It is
//! database-agnostic and defines traits that are implemented by the
//! `storage-sqlite` (ledger, local tables) and `remote-mysql` (remote reader)
//! crates.

pub mod apply;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ledger;
pub mod progress;
pub mod remote;
pub mod sync;
pub mod transform;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
