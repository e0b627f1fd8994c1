use std::collections::HashMap;
use std::sync::Arc;

use super::mapped_transformer::MappedTransformer;
use super::result_transformer::{ResultTransformer, RESULTS_TABLE};
use super::student_transformer::{StudentTransformer, STUDENTS_TABLE};
use super::transform_traits::RowTransformer;
use crate::config::SyncConfig;
use crate::errors::{Result, SyncError};

/// A transformer bound to one table and run config.
#[derive(Clone)]
pub struct ResolvedTransformer {
    pub transformer: Arc<dyn RowTransformer>,
    /// Remote column the window is taken over
    pub remote_key_column: String,
    /// Local natural key columns
    pub natural_key: Vec<String>,
}

/// Maps table names to their transformation rules.
#[derive(Clone)]
pub struct TransformerRegistry {
    builtins: HashMap<String, Arc<dyn RowTransformer>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformerRegistry {
    /// Registry with the built-in `acad_results` and `students` rules.
    pub fn new() -> Self {
        let mut registry = Self {
            builtins: HashMap::new(),
        };
        registry.register(RESULTS_TABLE, Arc::new(ResultTransformer::new()));
        registry.register(STUDENTS_TABLE, Arc::new(StudentTransformer::new()));
        registry
    }

    pub fn register(&mut self, table: &str, transformer: Arc<dyn RowTransformer>) {
        self.builtins.insert(table.to_string(), transformer);
    }

    pub fn has_builtin(&self, table: &str) -> bool {
        self.builtins.contains_key(table)
    }

    pub fn builtin_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.builtins.keys().cloned().collect();
        tables.sort();
        tables
    }

    /// Resolves the rules for `table`. Tables without built-in rules need a
    /// `primary_key` in the config.
    pub fn resolve(&self, table: &str, config: &SyncConfig) -> Result<ResolvedTransformer> {
        let transformer: Arc<dyn RowTransformer> = match self.builtins.get(table) {
            Some(builtin) => builtin.clone(),
            None => match MappedTransformer::from_config(config) {
                Some(mapped) => Arc::new(mapped),
                None => return Err(SyncError::UnsupportedTable(table.to_string()).into()),
            },
        };

        let remote_key_column = config
            .primary_key
            .clone()
            .unwrap_or_else(|| transformer.remote_key_column().to_string());
        let natural_key = transformer.natural_key();

        Ok(ResolvedTransformer {
            transformer,
            remote_key_column,
            natural_key,
        })
    }
}
