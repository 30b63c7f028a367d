//! Cache-aside reads and write-through mirroring for posts.

use crate::backend::CacheBackend;
use crate::domain::{NewPost, Post, PostUpdate, User};
use crate::error::{Error, Result};
use crate::repository::{DataRepository, PostCache, PostRepository, PostStore, UserStore};
use std::sync::Arc;

/// Composes the authoritative post store with the post cache.
///
/// Reads try the cache first and fall back to the store, populating the
/// cache with what they load. Writes go to the store, then to the cache.
/// Nothing spans both in a transaction: a cache failure after a successful
/// store write is returned to the caller and the two stay diverged until the
/// post is written again.
///
/// # Example
///
/// ```no_run
/// use posts_api::backend::InMemoryBackend;
/// use posts_api::repository::{InMemoryPostStore, InMemoryUserStore, PostCache};
/// use posts_api::service::PostService;
/// use std::sync::Arc;
///
/// # async fn example() -> posts_api::Result<()> {
/// let service = PostService::new(
///     Arc::new(InMemoryPostStore::new()),
///     PostCache::new(InMemoryBackend::new()),
///     Arc::new(InMemoryUserStore::new()),
/// );
/// let posts = service.find_all().await?;
/// # Ok(())
/// # }
/// ```
pub struct PostService<B: CacheBackend> {
    store: Arc<dyn PostStore>,
    cache: PostCache<B>,
    users: Arc<dyn UserStore>,
}

impl<B: CacheBackend> PostService<B> {
    pub fn new(store: Arc<dyn PostStore>, cache: PostCache<B>, users: Arc<dyn UserStore>) -> Self {
        PostService {
            store,
            cache,
            users,
        }
    }

    /// Get cache reference.
    pub fn cache(&self) -> &PostCache<B> {
        &self.cache
    }

    /// Get store reference.
    pub fn store(&self) -> &dyn PostStore {
        &*self.store
    }

    /// Every post.
    ///
    /// A non-empty cache is served as-is, even when it holds fewer posts
    /// than the store. Only an empty cache triggers a store load.
    pub async fn find_all(&self) -> Result<Vec<Post>> {
        let cached = self.cache.fetch_all().await?;
        if !cached.is_empty() {
            debug!("Serving {} posts from cache", cached.len());
            return Ok(cached);
        }

        let posts = self.store.fetch_all().await?;
        if !posts.is_empty() {
            self.cache.save_all(&posts).await?;
            info!("Loaded {} posts from store into cache", posts.len());
        }
        Ok(posts)
    }

    /// One post.
    ///
    /// # Errors
    /// `Error::NotFound` if neither the cache nor the store has it.
    pub async fn find_by_id(&self, id: i64) -> Result<Post> {
        if let Some(post) = self.cache.fetch_by_id(id).await? {
            return Ok(post);
        }

        let post = self
            .store
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Post with id {} not found", id)))?;
        self.cache.save(&post).await?;
        debug!("Post {} loaded from store", id);
        Ok(post)
    }

    /// Posts owned by `user_id`.
    ///
    /// # Errors
    /// `Error::NotFound` if the cache has nothing for the user and the user
    /// does not exist.
    pub async fn find_all_by_user_id(&self, user_id: i64) -> Result<Vec<Post>> {
        let cached = self.cache.fetch_all_by_user_id(user_id).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }

        self.require_user(user_id).await?;
        let posts = self.store.fetch_all_by_user_id(user_id).await?;
        if !posts.is_empty() {
            self.cache.save_all(&posts).await?;
        }
        Ok(posts)
    }

    /// Persist a new post and mirror it into the cache.
    ///
    /// # Errors
    /// `Error::NotFound` if the owner does not exist; the store is not
    /// touched in that case.
    pub async fn create(&self, post: NewPost) -> Result<Post> {
        self.require_user(post.user_id).await?;

        let created = self.store.insert(post).await?;
        self.cache.save(&created).await?;
        info!("Post {} created for user {}", created.id, created.user_id);
        Ok(created)
    }

    /// Replace title, content and owner of an existing post.
    ///
    /// # Errors
    /// `Error::NotFound` if the new owner or the post does not exist.
    pub async fn update(&self, update: PostUpdate) -> Result<Post> {
        self.require_user(update.user_id).await?;

        let updated = self.store.update(update).await?;
        self.cache.save(&updated).await?;
        info!("Post {} updated", updated.id);
        Ok(updated)
    }

    /// Remove a post from the store and the cache.
    ///
    /// # Errors
    /// `Error::NotFound` if the store does not have the post.
    pub async fn delete_by_id(&self, id: i64) -> Result<()> {
        if self.store.fetch_by_id(id).await?.is_none() {
            return Err(Error::NotFound("Post not found".to_string()));
        }

        self.store.delete_by_id(id).await?;
        self.cache.delete_by_id(id).await?;
        info!("Post {} deleted", id);
        Ok(())
    }

    /// The owner of `post`, if it still exists.
    pub async fn author(&self, post: &Post) -> Result<Option<User>> {
        self.users.fetch_by_id(post.user_id).await
    }

    async fn require_user(&self, user_id: i64) -> Result<User> {
        self.users.fetch_by_id(user_id).await?.ok_or_else(|| {
            debug!("User {} does not exist", user_id);
            Error::NotFound("User not found".to_string())
        })
    }
}
