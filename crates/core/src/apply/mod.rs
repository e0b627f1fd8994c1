//! Upsert Applier - insert/update/skip classification against local tables.

mod apply_model;
mod apply_service;
mod apply_traits;


pub use apply_model::{RowDiff, RowOutcome, UpsertPlan};
pub use apply_service::{plan_upsert, values_equal, UpsertApplier};
pub use apply_traits::LocalTableStore;
