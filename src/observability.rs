//! Metrics hooks for the post cache.
//!
//! [`PostCache`](crate::repository::PostCache) reports every lookup, write
//! and delete through a [`CacheMetrics`] implementation. The default,
//! [`NoOpMetrics`], discards everything. [`CountingMetrics`] keeps atomic
//! counters that are cheap to share and easy to assert against.
//!
//! ```
//! use posts_api::observability::{CacheMetrics, CountingMetrics};
//! use std::time::Duration;
//!
//! let metrics = CountingMetrics::new();
//! metrics.record_miss("post:1", Duration::from_micros(40));
//! metrics.record_hit("post:1", Duration::from_micros(5));
//! assert_eq!(metrics.snapshot().hits, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Trait for cache metrics collection.
///
/// The default methods log at debug level, so an empty `impl` is a
/// logging collector.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("Cache HIT: {} took {:?}", key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("Cache MISS: {} took {:?}", key, duration);
    }

    /// Record a cache set operation.
    fn record_set(&self, key: &str, duration: Duration) {
        debug!("Cache SET: {} took {:?}", key, duration);
    }

    /// Record a cache delete operation.
    fn record_delete(&self, key: &str, duration: Duration) {
        debug!("Cache DELETE: {} took {:?}", key, duration);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_set(&self, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _key: &str, _duration: Duration) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Logs every event through the trait's default methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// Counter values at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

/// Atomic counters. Clones share the same counters.
#[derive(Clone, Default)]
pub struct CountingMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    sets: Arc<AtomicU64>,
    deletes: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
}

impl CountingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl CacheMetrics for CountingMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _key: &str, _duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_set(&self, _key: &str, _duration: Duration) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delete(&self, _key: &str, _duration: Duration) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_error(&self, key: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!("Cache ERROR for {}: {}", key, error);
    }
}
