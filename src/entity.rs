//! Trait for values mirrored into the cache.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A record that can be stored in the cache under `"{prefix}:{key}"`.
///
/// # Example
///
/// ```
/// use posts_api::CacheEntity;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Draft {
///     id: i64,
///     body: String,
/// }
///
/// impl CacheEntity for Draft {
///     type Key = i64;
///
///     fn cache_key(&self) -> Self::Key {
///         self.id
///     }
///
///     fn cache_prefix() -> &'static str {
///         "draft"
///     }
/// }
/// ```
pub trait CacheEntity: Send + Sync + Serialize + for<'de> Deserialize<'de> + Clone {
    /// Type of the entity's id.
    type Key: Display + Copy + Send + Sync + Eq + 'static;

    /// Return the entity's id.
    fn cache_key(&self) -> Self::Key;

    /// Namespace for this entity's keys, e.g. `"post"`.
    fn cache_prefix() -> &'static str;

    /// Serialize entity for cache storage (versioned envelope).
    fn serialize_for_cache(&self) -> Result<Vec<u8>> {
        crate::serialization::serialize_for_cache(self)
    }

    /// Deserialize entity from cache storage.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidCacheEntry`: bad magic
    /// - `Error::VersionMismatch`: schema version changed
    /// - `Error::DeserializationError`: corrupted payload
    fn deserialize_from_cache(bytes: &[u8]) -> Result<Self> {
        crate::serialization::deserialize_from_cache(bytes)
    }

    /// Optional: validate entity after deserialization.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
