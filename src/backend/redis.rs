//! Redis cache backend implementation.

use super::CacheBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Pool, Runtime};
use std::time::Duration;

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Default Redis connection pool size.
pub const DEFAULT_POOL_SIZE: u32 = 16;

/// Default Redis URL.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Configuration for Redis backend.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// `redis://[user:password@]host:port[/db]`
    pub url: String,
    pub pool_size: u32,
    /// How long a request waits for a pooled connection.
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            url: DEFAULT_REDIS_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

/// Redis backend with connection pooling and async operations.
///
/// # Example
///
/// ```no_run
/// # use posts_api::backend::{RedisBackend, RedisConfig, CacheBackend};
/// # async fn example() -> posts_api::Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default())?;
/// backend.set("post:1", b"value".to_vec()).await?;
/// let value = backend.get("post:1").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Create new Redis backend from configuration.
    ///
    /// Connections are opened lazily; use [`CacheBackend::health_check`] to
    /// verify reachability.
    ///
    /// # Errors
    /// Returns `Err` if the pool cannot be created (invalid URL).
    pub fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.url.clone());
        let mut pool_cfg = deadpool_redis::PoolConfig::new(config.pool_size as usize);
        pool_cfg.timeouts.wait = Some(config.connection_timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::BackendError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized (pool size: {})",
            config.pool_size
        );

        Ok(RedisBackend { pool })
    }

    /// Create from connection string with default pool settings.
    ///
    /// # Errors
    /// Returns `Err` if the pool cannot be created.
    pub fn from_connection_string(conn_str: &str) -> Result<Self> {
        Self::new(RedisConfig {
            url: conn_str.to_string(),
            ..Default::default()
        })
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
        }
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::BackendError(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis GET failed for key {}: {}", key, e)))?;

        if value.is_some() {
            debug!("✓ Redis GET {} -> HIT", key);
        } else {
            debug!("✓ Redis GET {} -> MISS", key);
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(|e| Error::BackendError(format!("Redis SET failed for key {}: {}", key, e)))?;

        debug!("✓ Redis SET {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| Error::BackendError(format!("Redis DEL failed for key {}: {}", key, e)))?;

        debug!("✓ Redis DELETE {}", key);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        // MGET with no arguments is a Redis error
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;

        let values: Vec<Option<Vec<u8>>> = deadpool_redis::redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis MGET failed: {}", e)))?;

        debug!("✓ Redis MGET {} keys", keys.len());
        Ok(values)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection().await?;

        let pong: String = deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| Error::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong.contains("PONG"))
    }
}
