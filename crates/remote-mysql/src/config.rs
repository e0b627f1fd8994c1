//! Connection settings for the remote MySQL source.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::ConnectOptions;

use records_sync_core::constants::DEFAULT_REMOTE_QUERY_TIMEOUT_SECS;

pub const DEFAULT_REMOTE_PORT: u16 = 3306;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: String,
    /// Upper bound for every remote query, in seconds.
    pub query_timeout_secs: u64,
    pub max_connections: u32,
}

impl Default for RemoteDbConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_REMOTE_PORT,
            username: "root".to_string(),
            password: None,
            database: "legacy".to_string(),
            query_timeout_secs: DEFAULT_REMOTE_QUERY_TIMEOUT_SECS,
            max_connections: 10,
        }
    }
}

// Password stays out of logs.
impl fmt::Debug for RemoteDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl RemoteDbConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs.max(1))
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username);

        if let Some(pwd) = &self.password {
            options = options.password(pwd);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }

        options.log_statements(log::LevelFilter::Debug)
    }

    /// Pool settings. The pool is lazy: nothing is opened until the first query.
    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .min_connections(0)
            .acquire_timeout(self.query_timeout().min(Duration::from_secs(10)))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RemoteDbConfig::default();
        assert_eq!(config.port, 3306);
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.endpoint(), "127.0.0.1:3306/legacy");
    }

    #[test]
    fn test_zero_timeout_is_raised_to_one_second() {
        let config = RemoteDbConfig {
            query_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.query_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = RemoteDbConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_password_is_not_serialized() {
        let config = RemoteDbConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["queryTimeoutSecs"], 30);
    }
}
