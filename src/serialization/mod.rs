//! Postcard-based cache serialization with versioned envelopes.
//!
//! Every value the service writes to the cache is wrapped as:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "PAPI"              u32                postcard::to_allocvec(T)
//! ```
//!
//! The cache is disposable, so an entry that fails validation is never
//! migrated: callers evict it and reload from the store.
//!
//! # Example
//!
//! ```rust
//! use posts_api::serialization::{serialize_for_cache, deserialize_from_cache};
//!
//! # fn main() -> posts_api::Result<()> {
//! let ids: Vec<i64> = vec![1, 2, 3];
//! let bytes = serialize_for_cache(&ids)?;
//! let back: Vec<i64> = deserialize_from_cache(&bytes)?;
//! assert_eq!(ids, back);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header for posts-api cache entries.
pub const CACHE_MAGIC: [u8; 4] = *b"PAPI";

/// Current schema version.
///
/// Increment when the layout of any cached type changes (fields added,
/// removed, reordered or retyped). Old entries then fail validation and are
/// reloaded from the store.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for cache entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Magic header: must be [`CACHE_MAGIC`]
    pub magic: [u8; 4],
    /// Schema version: must match [`CURRENT_SCHEMA_VERSION`]
    pub version: u32,
    /// The cached value
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a value with envelope for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from cache storage with validation.
///
/// Checks, in order: envelope decodes, magic matches, version matches.
///
/// # Errors
///
/// - `Error::DeserializationError`: corrupted Postcard bytes
/// - `Error::InvalidCacheEntry`: invalid magic header
/// - `Error::VersionMismatch`: schema version mismatch
pub fn deserialize_from_cache<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        warn!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        warn!(
            "Invalid cache entry: expected magic {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        );
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}
