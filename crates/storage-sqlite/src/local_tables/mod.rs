//! SQLite storage for the local tables rows are synced into.

mod repository;

pub use repository::LocalTableRepository;
