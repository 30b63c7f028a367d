//! In-memory cache backend (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Suitable for a single instance; every process has its own cache.

use super::CacheBackend;
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same map.
///
/// # Example
///
/// ```no_run
/// use posts_api::backend::{CacheBackend, InMemoryBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///     backend.set("post:1", b"value".to_vec()).await?;
///     assert!(backend.get("post:1").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new in-memory cache backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Get the current number of entries in cache, indexes included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get memory statistics.
    pub fn stats(&self) -> CacheStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.value().len()).sum();

        CacheStats {
            total_entries: self.store.len(),
            total_bytes,
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.store.get(key) {
            Some(entry) => {
                debug!("✓ InMemory GET {} -> HIT", key);
                Ok(Some(entry.value().clone()))
            }
            None => {
                debug!("✓ InMemory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.store.insert(key.to_string(), value);
        debug!("✓ InMemory SET {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let results = keys
            .iter()
            .map(|k| self.store.get(k).map(|entry| entry.value().clone()))
            .collect();

        debug!("✓ InMemory MGET {} keys", keys.len());
        Ok(results)
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_bytes: usize,
}
