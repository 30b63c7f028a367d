//! Cache backend implementations.

use crate::error::Result;
use async_trait::async_trait;

pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend, RedisConfig};

/// Trait for cache backend implementations.
///
/// A plain byte key-value store. Entries never expire on their own: a post
/// stays cached until it is overwritten or deleted.
///
/// All methods take `&self`; implementations use interior mutability
/// (DashMap) or external storage (Redis) so one backend can be shared
/// across request handlers.
#[async_trait]
pub trait CacheBackend: Send + Sync + Clone + 'static {
    /// Retrieve value from cache by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value found in cache
    /// - `Ok(None)` - Cache miss (key not found)
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs (connection lost, etc.)
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store value in cache, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove value from cache. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn delete(&self, key: &str) -> Result<()>;

    /// Bulk get operation.
    ///
    /// Default implementation calls `get()` for each key.
    /// Override for batch efficiency (e.g., Redis MGET).
    ///
    /// # Errors
    /// Returns `Err` if backend error occurs
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            results.push(self.get(key).await?);
        }
        Ok(results)
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
