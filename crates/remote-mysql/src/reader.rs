//! `RemoteTableReader` over a sqlx MySQL pool.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use sqlx::mysql::MySqlPool;
use sqlx::Row;

use records_sync_core::errors::{Error, RemoteError, Result};
use records_sync_core::remote::{RemoteConnectionStatus, RemoteRow, RemoteTableReader};
use records_sync_core::utils::validate_identifier;

use crate::config::RemoteDbConfig;
use crate::decode::row_to_remote;

/// Quotes a validated identifier for MySQL.
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name).map(|n| format!("`{}`", n.replace('`', "``")))
}

/// `SELECT` for one key window. Values are bound: start, end, limit.
pub fn window_query(table: &str, key_column: &str) -> Result<String> {
    let table = quote_identifier(table)?;
    let key = quote_identifier(key_column)?;
    Ok(format!(
        "SELECT * FROM {table} WHERE {key} >= ? AND {key} < ? ORDER BY {key} ASC LIMIT ?"
    ))
}

/// Maps a driver error to a remote error. Transport problems are connection
/// failures; everything else is a failed query.
pub fn map_sqlx_error(err: sqlx::Error, endpoint: &str) -> Error {
    let message = err.to_string();
    let remote = match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            if message.contains("os error 111") {
                RemoteError::ConnectionFailed(format!(
                    "Connection refused by {} ({})",
                    endpoint, message
                ))
            } else {
                RemoteError::ConnectionFailed(format!("{} ({})", message, endpoint))
            }
        }
        sqlx::Error::Configuration(_) => RemoteError::ConnectionFailed(message),
        _ => RemoteError::QueryFailed(message),
    };
    Error::Remote(remote)
}

pub struct MySqlTableReader {
    pool: MySqlPool,
    query_timeout: Duration,
    endpoint: String,
}

impl MySqlTableReader {
    /// Builds a reader over a lazy pool; no connection is attempted here.
    pub fn new(config: &RemoteDbConfig) -> Self {
        let pool = config
            .pool_options()
            .connect_lazy_with(config.connect_options());
        Self::with_pool(pool, config.query_timeout(), config.endpoint())
    }

    pub fn with_pool(pool: MySqlPool, query_timeout: Duration, endpoint: String) -> Self {
        Self {
            pool,
            query_timeout,
            endpoint,
        }
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Runs `fut` under the query timeout.
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("Remote {} on {} failed: {}", what, self.endpoint, e);
                Err(map_sqlx_error(e, &self.endpoint))
            }
            Err(_) => {
                warn!(
                    "Remote {} on {} timed out after {}s",
                    what,
                    self.endpoint,
                    self.query_timeout.as_secs()
                );
                Err(Error::Remote(RemoteError::Timeout(
                    self.query_timeout.as_secs(),
                )))
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn string_column(row: &sqlx::mysql::MySqlRow, index: usize) -> Option<String> {
    row.try_get::<String, _>(index).ok().or_else(|| {
        row.try_get::<Vec<u8>, _>(index)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
    })
}

#[async_trait]
impl RemoteTableReader for MySqlTableReader {
    async fn fetch_window(
        &self,
        table: &str,
        key_column: &str,
        start_id: i64,
        limit: i64,
    ) -> Result<Vec<RemoteRow>> {
        let sql = window_query(table, key_column)?;
        let end_id = start_id.saturating_add(limit);
        debug!(
            "Fetching {} window [{}, {}) by {}",
            table, start_id, end_id, key_column
        );

        let rows = self
            .bounded(
                "window read",
                sqlx::query(&sql)
                    .bind(start_id)
                    .bind(end_id)
                    .bind(limit)
                    .fetch_all(&self.pool),
            )
            .await?;

        rows.iter().map(row_to_remote).collect()
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table)?);
        let row = self
            .bounded("row count", sqlx::query(&sql).fetch_one(&self.pool))
            .await?;
        row.try_get::<i64, _>(0)
            .map_err(|e| Error::Remote(RemoteError::Decode(e.to_string())))
    }

    async fn ping(&self) -> RemoteConnectionStatus {
        let probe = self
            .bounded(
                "connection test",
                sqlx::query("SELECT VERSION(), DATABASE()").fetch_one(&self.pool),
            )
            .await;

        match probe {
            Ok(row) => RemoteConnectionStatus::connected(
                string_column(&row, 1),
                string_column(&row, 0),
            ),
            Err(e) => RemoteConnectionStatus::failed(e.to_string()),
        }
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows = self
            .bounded(
                "table listing",
                sqlx::query(
                    "SELECT TABLE_NAME FROM information_schema.TABLES \
                     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' \
                     ORDER BY TABLE_NAME",
                )
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| string_column(row, 0))
            .collect())
    }
}
