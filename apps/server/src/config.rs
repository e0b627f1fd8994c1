use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context};
use records_sync_core::config::validate_range_limit;
use records_sync_core::constants::{
    DEFAULT_PROGRESS_FLUSH_EVERY, DEFAULT_RANGE_LIMIT, DEFAULT_REMOTE_QUERY_TIMEOUT_SECS,
};
use records_sync_core::sync::SyncSettings;
use records_sync_core::utils::validate_identifier;
use records_sync_remote_mysql::config::DEFAULT_REMOTE_PORT;
use records_sync_remote_mysql::RemoteDbConfig;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub remote: RemoteDbConfig,
    pub sync: SyncSettings,
    /// Tables the interval scheduler runs; empty disables it.
    pub scheduled_tables: Vec<String>,
    pub schedule_interval: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        _ => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = parse_env(
            "RS_LISTEN_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        )?;
        let db_path = env_or("RS_DB_PATH", "./db/records-sync.db");
        let cors_allow = split_list(&env_or("RS_CORS_ALLOW_ORIGINS", "*"));
        let request_timeout =
            Duration::from_millis(parse_env("RS_REQUEST_TIMEOUT_MS", 300_000u64)?);

        let remote = RemoteDbConfig {
            host: env_or("RS_REMOTE_HOST", "127.0.0.1"),
            port: parse_env("RS_REMOTE_PORT", DEFAULT_REMOTE_PORT)?,
            username: env_or("RS_REMOTE_USER", "root"),
            password: std::env::var("RS_REMOTE_PASSWORD").ok(),
            database: env_or("RS_REMOTE_DATABASE", "legacy"),
            query_timeout_secs: parse_env(
                "RS_REMOTE_QUERY_TIMEOUT_SECS",
                DEFAULT_REMOTE_QUERY_TIMEOUT_SECS,
            )?,
            ..Default::default()
        };

        let default_range_limit = parse_env("RS_DEFAULT_RANGE_LIMIT", DEFAULT_RANGE_LIMIT)?;
        validate_range_limit(default_range_limit)
            .map_err(|e| anyhow::anyhow!("Invalid RS_DEFAULT_RANGE_LIMIT: {}", e))?;
        let progress_flush_every =
            parse_env("RS_PROGRESS_FLUSH_EVERY", DEFAULT_PROGRESS_FLUSH_EVERY)?;
        if progress_flush_every == 0 {
            bail!("Invalid RS_PROGRESS_FLUSH_EVERY: must be at least 1");
        }

        let scheduled_tables = split_list(&env_or("RS_SCHEDULED_TABLES", ""));
        for table in &scheduled_tables {
            validate_identifier(table)
                .map_err(|e| anyhow::anyhow!("Invalid RS_SCHEDULED_TABLES: {}", e))?;
        }
        let interval_secs: u64 = parse_env("RS_SCHEDULE_INTERVAL_SECS", 3600)?;
        if interval_secs == 0 {
            bail!("Invalid RS_SCHEDULE_INTERVAL_SECS: must be at least 1");
        }

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout,
            remote,
            sync: SyncSettings {
                default_range_limit,
                progress_flush_every,
            },
            scheduled_tables,
            schedule_interval: Duration::from_secs(interval_secs),
        })
    }
}
