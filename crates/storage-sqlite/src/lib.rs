//! SQLite storage implementation for Records Sync.
//!
//! This crate provides all database-related functionality using Diesel ORM with SQLite.
//! It implements the repository traits defined in `records-sync-core` and contains:
//! - Database connection pooling and the single-writer actor
//! - Diesel migrations (ledger table and the local tables rows are synced into)
//! - The Sync Ledger repository
//! - The local table store used by the Upsert Applier
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies exist.
//!
//! ```text
//! core (domain)          remote-mysql (source)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod ledger;
pub mod local_tables;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use ledger::SyncLedgerRepository;
pub use local_tables::LocalTableRepository;

// Re-export from records-sync-core for convenience
pub use records_sync_core::errors::{DatabaseError, Error, Result};
