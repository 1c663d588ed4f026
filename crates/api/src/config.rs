use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tenders_core::pagination::PagePolicy;
use tenders_core::ServiceSettings;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Where tenders and bids are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres {
        database_url: String,
        max_connections: u32,
    },
    /// Process-local store; the directory comes from `DIRECTORY_SEED_FILE`.
    Memory,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub store: StoreBackend,
    /// Deadline for a single store call in seconds (default: `5`).
    pub store_timeout_secs: u64,
    pub page_default_limit: i64,
    pub page_max_limit: i64,
    /// JSON file with employees and organizations to load into the
    /// in-memory store.
    pub directory_seed: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8080`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `STORE_BACKEND`        | `postgres`                 |
    /// | `DATABASE_URL`         | required for `postgres`    |
    /// | `DB_MAX_CONNECTIONS`   | `20`                       |
    /// | `STORE_TIMEOUT_SECS`   | `5`                        |
    /// | `PAGE_DEFAULT_LIMIT`   | `5`                        |
    /// | `PAGE_MAX_LIMIT`       | `50`                       |
    /// | `DIRECTORY_SEED_FILE`  | unset                      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let host = var("HOST", "0.0.0.0");
        let port: u16 = parse("PORT", &var("PORT", "8080"), "a valid port number")?;

        let cors_origins: Vec<String> = var("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse(
            "REQUEST_TIMEOUT_SECS",
            &var("REQUEST_TIMEOUT_SECS", "30"),
            "a whole number of seconds",
        )?;

        let store = match var("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse(
                    "DB_MAX_CONNECTIONS",
                    &var("DB_MAX_CONNECTIONS", "20"),
                    "a positive integer",
                )?,
            },
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                    expected: "'postgres' or 'memory'",
                })
            }
        };

        let store_timeout_secs: u64 = parse(
            "STORE_TIMEOUT_SECS",
            &var("STORE_TIMEOUT_SECS", "5"),
            "a whole number of seconds",
        )?;
        if store_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "STORE_TIMEOUT_SECS",
                value: store_timeout_secs.to_string(),
                expected: "at least one second",
            });
        }

        let page_default_limit: i64 = parse(
            "PAGE_DEFAULT_LIMIT",
            &var("PAGE_DEFAULT_LIMIT", "5"),
            "a positive integer",
        )?;
        let page_max_limit: i64 = parse(
            "PAGE_MAX_LIMIT",
            &var("PAGE_MAX_LIMIT", "50"),
            "a positive integer",
        )?;
        if page_default_limit <= 0 {
            return Err(ConfigError::Invalid {
                name: "PAGE_DEFAULT_LIMIT",
                value: page_default_limit.to_string(),
                expected: "a positive integer",
            });
        }
        if page_max_limit < page_default_limit {
            return Err(ConfigError::Invalid {
                name: "PAGE_MAX_LIMIT",
                value: page_max_limit.to_string(),
                expected: "at least PAGE_DEFAULT_LIMIT",
            });
        }

        let directory_seed = lookup("DIRECTORY_SEED_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store,
            store_timeout_secs,
            page_default_limit,
            page_max_limit,
            directory_seed,
        })
    }

    /// Tunables handed to the procurement facade.
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            store_timeout: Duration::from_secs(self.store_timeout_secs),
            pages: PagePolicy {
                default_limit: self.page_default_limit,
                max_limit: self.page_max_limit,
            },
        }
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
        expected,
    })
}
