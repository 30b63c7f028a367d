//! Runtime configuration from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//! Variables already set in the environment win over the file.

use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_REDIS_POOL_SIZE: u32 = 16;

/// Where posts and users are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Postgres {
        url: String,
        max_connections: u32,
    },
    /// Process-local tables, lost on restart.
    Memory,
}

/// Which cache backend mirrors the posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheConfig {
    InMemory,
    Redis { url: String, pool_size: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Read configuration from the process environment (and `.env`).
    ///
    /// # Errors
    /// `Error::ConfigError` for unparsable values, unknown backend names or
    /// a missing `DATABASE_URL` with the Postgres store.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT)?;

        let store = match lookup("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StoreConfig::Postgres {
                url: lookup("DATABASE_URL").ok_or_else(|| {
                    Error::ConfigError("DATABASE_URL must be set for the postgres store".to_string())
                })?,
                max_connections: parse_or(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_MAX_CONNECTIONS,
                )?,
            },
            "memory" => StoreConfig::Memory,
            other => {
                return Err(Error::ConfigError(format!(
                    "Unknown STORE_BACKEND '{}' (expected postgres or memory)",
                    other
                )))
            }
        };

        let cache = match lookup("CACHE_BACKEND").as_deref().unwrap_or("inmemory") {
            "inmemory" => CacheConfig::InMemory,
            "redis" => CacheConfig::Redis {
                url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
                pool_size: parse_or(&lookup, "REDIS_POOL_SIZE", DEFAULT_REDIS_POOL_SIZE)?,
            },
            other => {
                return Err(Error::ConfigError(format!(
                    "Unknown CACHE_BACKEND '{}' (expected inmemory or redis)",
                    other
                )))
            }
        };

        Ok(AppConfig {
            host,
            port,
            store,
            cache,
        })
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::ConfigError(format!("Invalid {} '{}': {}", name, raw, e))),
    }
}
