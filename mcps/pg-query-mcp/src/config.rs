//! Configuration for the PostgreSQL query MCP
//!
//! Everything is read from environment variables once at startup:
//!
//! | Variable                    | Default     |
//! |-----------------------------|-------------|
//! | `DB_HOST`                   | `localhost` |
//! | `DB_PORT`                   | `5432`      |
//! | `DB_NAME`                   | required    |
//! | `DB_USER`                   | required    |
//! | `DB_PASSWORD`               | required    |
//! | `DB_SSLMODE`                | `prefer`    |
//! | `DB_CONNECT_TIMEOUT_SECS`   | `10`        |
//! | `DB_STATEMENT_TIMEOUT_SECS` | unset       |
//! | `MAX_RESULTS`               | unset       |

use std::str::FromStr;
use std::time::Duration;

use tokio_postgres::config::SslMode;

use crate::types::DbError;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const APPLICATION_NAME: &str = "pg-query-mcp";

/// Database connection settings
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: SslMode,
    pub connect_timeout: Duration,
    /// Server-side `statement_timeout`; `None` leaves the server default
    pub statement_timeout: Option<Duration>,
}

/// Execution limits applied by the server
#[derive(Debug, Clone, Default)]
pub struct ServerSettings {
    /// Rows kept per result; extra rows are dropped and flagged as truncated.
    /// `None` returns every row.
    pub max_results: Option<usize>,
}

/// Full server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub settings: ServerSettings,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<&str> = ["DB_NAME", "DB_USER", "DB_PASSWORD"]
            .into_iter()
            .filter(|key| var(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DbError::Configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let ssl_mode = match var("DB_SSLMODE").as_deref() {
            None | Some("prefer") => SslMode::Prefer,
            Some("disable") => SslMode::Disable,
            Some("require") => SslMode::Require,
            Some(other) => {
                return Err(DbError::Configuration(format!(
                    "DB_SSLMODE must be one of disable, prefer, require (got '{}')",
                    other
                )))
            }
        };

        let connection = ConnectionConfig {
            host: var("DB_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(var("DB_PORT"), "DB_PORT", DEFAULT_PORT)?,
            database: var("DB_NAME").unwrap_or_default(),
            user: var("DB_USER").unwrap_or_default(),
            password: var("DB_PASSWORD").unwrap_or_default(),
            ssl_mode,
            connect_timeout: Duration::from_secs(parse_or(
                var("DB_CONNECT_TIMEOUT_SECS"),
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            statement_timeout: var("DB_STATEMENT_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>(&v, "DB_STATEMENT_TIMEOUT_SECS"))
                .transpose()?
                .map(Duration::from_secs),
        };

        let max_results = var("MAX_RESULTS")
            .map(|v| parse_value::<usize>(&v, "MAX_RESULTS"))
            .transpose()?;
        if max_results == Some(0) {
            return Err(DbError::Configuration(
                "MAX_RESULTS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            connection,
            settings: ServerSettings { max_results },
        })
    }
}

impl ConnectionConfig {
    /// Build the driver configuration
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password)
            .ssl_mode(self.ssl_mode)
            .connect_timeout(self.connect_timeout)
            .application_name(APPLICATION_NAME);

        if let Some(timeout) = self.statement_timeout {
            config.options(&format!("-c statement_timeout={}", timeout.as_millis()));
        }

        config
    }

    /// Connection target for log lines; never includes the password
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, DbError> {
    match value {
        Some(v) => parse_value(&v, key),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(value: &str, key: &str) -> Result<T, DbError> {
    value.trim().parse().map_err(|_| {
        DbError::Configuration(format!("{} has an invalid value: '{}'", key, value))
    })
}
