//! Cache-backed post repository.
//!
//! Mirrors posts into a [`CacheBackend`] using the layout in
//! [`crate::key`]: one entry per post plus two id indexes (per owner and
//! global). Indexes are maintained with read-modify-write and no locking;
//! concurrent writers may lose index updates, which only ever makes the
//! cache look emptier than it is.

use super::{DataRepository, PostRepository};
use crate::backend::CacheBackend;
use crate::domain::Post;
use crate::entity::CacheEntity;
use crate::error::{Error, Result};
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Disposable mirror of the post table.
///
/// An absent, corrupted or version-mismatched entry reads as a miss, never
/// as an error. Backend failures do propagate.
///
/// # Example
///
/// ```no_run
/// use posts_api::backend::InMemoryBackend;
/// use posts_api::repository::{DataRepository, PostCache};
///
/// # async fn example(post: posts_api::domain::Post) -> posts_api::Result<()> {
/// let cache = PostCache::new(InMemoryBackend::new());
/// cache.save(&post).await?;
/// assert!(cache.fetch_by_id(post.id).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostCache<B: CacheBackend> {
    backend: B,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B: CacheBackend> PostCache<B> {
    pub fn new(backend: B) -> Self {
        PostCache {
            backend,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Write one post and add it to both indexes.
    ///
    /// If the cached copy had a different owner, the post is moved out of
    /// the old owner's index.
    pub async fn save(&self, post: &Post) -> Result<()> {
        let timer = Instant::now();
        let key = CacheKeyBuilder::build::<Post>(&post.id);

        let previous = self.read_entry(&key).await?;
        let bytes = post.serialize_for_cache()?;
        if let Err(e) = self.backend.set(&key, bytes).await {
            self.metrics.record_error(&key, &e.to_string());
            return Err(e);
        }

        if let Some(previous) = previous.filter(|p| p.user_id != post.user_id) {
            debug!(
                "Post {} moved from user {} to user {}",
                post.id, previous.user_id, post.user_id
            );
            self.remove_from_index(&CacheKeyBuilder::user_index::<Post>(previous.user_id), post.id)
                .await?;
        }
        self.add_to_index(&CacheKeyBuilder::user_index::<Post>(post.user_id), post.id)
            .await?;
        self.add_to_index(&CacheKeyBuilder::all_index::<Post>(), post.id)
            .await?;

        self.metrics.record_set(&key, timer.elapsed());
        Ok(())
    }

    /// Write every post in `posts`.
    pub async fn save_all(&self, posts: &[Post]) -> Result<()> {
        for post in posts {
            self.save(post).await?;
        }
        debug!("✓ Cached {} posts", posts.len());
        Ok(())
    }

    /// Read and decode one entry; unusable entries are evicted.
    async fn read_entry(&self, key: &str) -> Result<Option<Post>> {
        let Some(bytes) = self.backend.get(key).await? else {
            return Ok(None);
        };

        match decode_entry(&bytes) {
            Ok(post) => Ok(Some(post)),
            Err(e) if is_unusable(&e) => {
                warn!("Evicting unreadable cache entry {}: {}", key, e);
                self.metrics.record_error(key, &e.to_string());
                self.backend.delete(key).await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Ids stored under an index key, sorted ascending.
    async fn read_index(&self, key: &str) -> Result<Vec<i64>> {
        match self.backend.get(key).await? {
            None => Ok(Vec::new()),
            Some(bytes) => match deserialize_from_cache::<Vec<i64>>(&bytes) {
                Ok(ids) => Ok(ids),
                Err(e) => {
                    warn!("Discarding unreadable cache index {}: {}", key, e);
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn write_index(&self, key: &str, ids: &[i64]) -> Result<()> {
        if ids.is_empty() {
            return self.backend.delete(key).await;
        }
        self.backend.set(key, serialize_for_cache(&ids)?).await
    }

    async fn add_to_index(&self, key: &str, id: i64) -> Result<()> {
        let mut ids = self.read_index(key).await?;
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
            self.write_index(key, &ids).await?;
        }
        Ok(())
    }

    async fn remove_from_index(&self, key: &str, id: i64) -> Result<()> {
        let mut ids = self.read_index(key).await?;
        if let Ok(pos) = ids.binary_search(&id) {
            ids.remove(pos);
            self.write_index(key, &ids).await?;
        }
        Ok(())
    }

    /// Load the posts an index points at, skipping ids whose entry is gone.
    ///
    /// With `owner`, posts the index still lists but whose entry belongs to
    /// another user are dropped as well.
    async fn fetch_indexed(&self, index_key: &str, owner: Option<i64>) -> Result<Vec<Post>> {
        let timer = Instant::now();
        let ids = self.read_index(index_key).await?;
        let posts: Vec<Post> = self
            .fetch_by_ids(&ids)
            .await?
            .into_iter()
            .flatten()
            .filter(|post| match owner {
                Some(user_id) if post.user_id != user_id => {
                    debug!(
                        "Skipping post {} in {}: owned by user {}",
                        post.id, index_key, post.user_id
                    );
                    false
                }
                _ => true,
            })
            .collect();

        if posts.is_empty() {
            self.metrics.record_miss(index_key, timer.elapsed());
        } else {
            self.metrics.record_hit(index_key, timer.elapsed());
        }
        Ok(posts)
    }
}

/// Decode an entry and check the ids it carries.
fn decode_entry(bytes: &[u8]) -> Result<Post> {
    let post = Post::deserialize_from_cache(bytes)?;
    post.validate()?;
    Ok(post)
}

/// Entries failing with these errors are dropped instead of reported.
fn is_unusable(e: &Error) -> bool {
    e.is_unreadable_entry() || matches!(e, Error::ValidationError(_))
}

#[async_trait]
impl<B: CacheBackend> DataRepository<Post> for PostCache<B> {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Post>> {
        let timer = Instant::now();
        let key = CacheKeyBuilder::build::<Post>(&id);

        let post = self.read_entry(&key).await?;
        if post.is_some() {
            self.metrics.record_hit(&key, timer.elapsed());
        } else {
            self.metrics.record_miss(&key, timer.elapsed());
        }
        Ok(post)
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<Option<Post>>> {
        let keys: Vec<String> = ids
            .iter()
            .map(|id| CacheKeyBuilder::build::<Post>(id))
            .collect();
        let values = self.backend.mget(&keys).await?;

        Ok(values
            .into_iter()
            .zip(keys.iter())
            .map(|(bytes, key)| {
                let Some(bytes) = bytes else {
                    return Ok(None);
                };
                match decode_entry(&bytes) {
                    Ok(post) => Ok(Some(post)),
                    Err(e) if is_unusable(&e) => {
                        warn!("Skipping unreadable cache entry {}: {}", key, e);
                        self.metrics.record_error(key, &e.to_string());
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<Vec<_>>>()?)
    }

    async fn fetch_all(&self) -> Result<Vec<Post>> {
        self.fetch_indexed(&CacheKeyBuilder::all_index::<Post>(), None)
            .await
    }

    async fn count(&self) -> Result<u64> {
        let ids = self
            .read_index(&CacheKeyBuilder::all_index::<Post>())
            .await?;
        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl<B: CacheBackend> PostRepository for PostCache<B> {
    async fn fetch_all_by_user_id(&self, user_id: i64) -> Result<Vec<Post>> {
        self.fetch_indexed(&CacheKeyBuilder::user_index::<Post>(user_id), Some(user_id))
            .await
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let timer = Instant::now();
        let key = CacheKeyBuilder::build::<Post>(&id);

        // The owner is only known from the cached copy; without it the
        // owner index keeps a dangling id that reads skip.
        if let Some(previous) = self.read_entry(&key).await? {
            self.remove_from_index(&CacheKeyBuilder::user_index::<Post>(previous.user_id), id)
                .await?;
        }
        self.remove_from_index(&CacheKeyBuilder::all_index::<Post>(), id)
            .await?;
        self.backend.delete(&key).await?;

        self.metrics.record_delete(&key, timer.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::observability::CountingMetrics;
    use crate::serialization::CacheEnvelope;
    use chrono::Utc;

    fn post(id: i64, user_id: i64) -> Post {
        let now = Utc::now();
        Post {
            id,
            title: format!("Post {}", id),
            content: "0123456789".to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_empty_cache_reads_as_miss() {
        let cache = PostCache::new(InMemoryBackend::new());

        assert!(cache.fetch_by_id(1).await.unwrap().is_none());
        assert!(cache.fetch_all().await.unwrap().is_empty());
        assert!(cache.fetch_all_by_user_id(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_populates_entry_and_indexes() {
        let backend = InMemoryBackend::new();
        let cache = PostCache::new(backend.clone());

        cache.save(&post(1, 10)).await.unwrap();
        cache.save(&post(2, 20)).await.unwrap();
        cache.save(&post(3, 10)).await.unwrap();

        let cached = cache.fetch_by_id(2).await.unwrap().expect("cached post");
        assert_eq!(cached.user_id, 20);
        assert_eq!(cached.title, "Post 2");

        let all: Vec<i64> = cache.fetch_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![1, 2, 3]);

        let owned: Vec<i64> = cache
            .fetch_all_by_user_id(10)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(owned, vec![1, 3]);
        assert_eq!(cache.count().await.unwrap(), 3);

        // 3 entries + 2 owner indexes + global index
        assert_eq!(backend.len(), 6);
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let cache = PostCache::new(InMemoryBackend::new());
        let p = post(1, 10);

        cache.save(&p).await.unwrap();
        cache.save(&p).await.unwrap();

        assert_eq!(cache.fetch_all().await.unwrap(), vec![p.clone()]);
        assert_eq!(cache.fetch_all_by_user_id(10).await.unwrap(), vec![p]);
    }

    #[tokio::test]
    async fn test_reassignment_moves_post_between_owner_indexes() {
        let cache = PostCache::new(InMemoryBackend::new());
        cache.save(&post(1, 10)).await.unwrap();

        let moved = post(1, 20);
        cache.save(&moved).await.unwrap();

        assert!(cache.fetch_all_by_user_id(10).await.unwrap().is_empty());
        assert_eq!(cache.fetch_all_by_user_id(20).await.unwrap(), vec![moved]);
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_index_ids() {
        let backend = InMemoryBackend::new();
        let cache = PostCache::new(backend.clone());
        cache.save(&post(1, 10)).await.unwrap();
        cache.save(&post(2, 10)).await.unwrap();

        cache.delete_by_id(1).await.unwrap();

        assert!(cache.fetch_by_id(1).await.unwrap().is_none());
        let remaining: Vec<i64> = cache.fetch_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![2]);
        assert_eq!(cache.fetch_all_by_user_id(10).await.unwrap().len(), 1);

        // deleting again is a no-op
        cache.delete_by_id(1).await.unwrap();

        cache.delete_by_id(2).await.unwrap();
        assert!(backend.is_empty(), "empty indexes are removed");
    }

    #[tokio::test]
    async fn test_index_skips_entries_missing_from_cache() {
        let backend = InMemoryBackend::new();
        let cache = PostCache::new(backend.clone());
        cache.save(&post(1, 10)).await.unwrap();
        cache.save(&post(2, 10)).await.unwrap();

        backend
            .delete(&CacheKeyBuilder::build::<Post>(&1))
            .await
            .unwrap();

        let owned: Vec<i64> = cache
            .fetch_all_by_user_id(10)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(owned, vec![2]);
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_evicted_and_reads_as_miss() {
        let backend = InMemoryBackend::new();
        let metrics = CountingMetrics::new();
        let cache = PostCache::new(backend.clone()).with_metrics(Arc::new(metrics.clone()));

        let stale = CacheEnvelope {
            magic: crate::serialization::CACHE_MAGIC,
            version: crate::serialization::CURRENT_SCHEMA_VERSION + 1,
            payload: post(1, 10),
        };
        backend
            .set("post:1", postcard::to_allocvec(&stale).unwrap())
            .await
            .unwrap();

        assert!(cache.fetch_by_id(1).await.unwrap().is_none());
        assert!(backend.get("post:1").await.unwrap().is_none());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.errors, 1);
    }

    #[tokio::test]
    async fn test_metrics_record_hits_and_misses() {
        let metrics = CountingMetrics::new();
        let cache = PostCache::new(InMemoryBackend::new()).with_metrics(Arc::new(metrics.clone()));

        cache.fetch_by_id(1).await.unwrap();
        cache.save(&post(1, 10)).await.unwrap();
        cache.fetch_by_id(1).await.unwrap();
        cache.fetch_all().await.unwrap();
        cache.delete_by_id(1).await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.sets, 1);
        assert_eq!(snapshot.deletes, 1);
    }

    #[tokio::test]
    async fn test_owner_listing_drops_posts_moved_while_uncached() {
        let backend = InMemoryBackend::new();
        let cache = PostCache::new(backend.clone());
        cache.save(&post(1, 10)).await.unwrap();
        cache.save(&post(2, 10)).await.unwrap();

        // Without the old entry, save cannot tell the post had another owner
        backend.delete("post:1").await.unwrap();
        cache.save(&post(1, 20)).await.unwrap();

        let old_owner: Vec<(i64, i64)> = cache
            .fetch_all_by_user_id(10)
            .await
            .unwrap()
            .iter()
            .map(|p| (p.id, p.user_id))
            .collect();
        assert_eq!(old_owner, vec![(2, 10)]);

        let new_owner: Vec<i64> = cache
            .fetch_all_by_user_id(20)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(new_owner, vec![1]);
    }

    #[tokio::test]
    async fn test_entry_with_invalid_ids_is_skipped_by_every_read() {
        let backend = InMemoryBackend::new();
        let metrics = CountingMetrics::new();
        let cache = PostCache::new(backend.clone()).with_metrics(Arc::new(metrics.clone()));
        cache.save(&post(1, 10)).await.unwrap();
        cache.save(&post(2, 10)).await.unwrap();

        let orphan = serialize_for_cache(&post(1, 0)).unwrap();
        backend.set("post:1", orphan).await.unwrap();

        let all: Vec<i64> = cache.fetch_all().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(all, vec![2]);
        let owned: Vec<i64> = cache
            .fetch_all_by_user_id(10)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(owned, vec![2]);
        assert_eq!(cache.fetch_by_ids(&[1, 2]).await.unwrap()[0], None);

        assert!(cache.fetch_by_id(1).await.unwrap().is_none());
        assert!(backend.get("post:1").await.unwrap().is_none(), "evicted on single read");
        assert_eq!(metrics.snapshot().errors, 4);
    }
}
