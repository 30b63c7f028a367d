//! Repository traits for the system of record and the post cache.
//!
//! Posts are reachable through one read/delete interface, [`PostRepository`],
//! with two backing implementations:
//!
//! - the **store** ([`PostStore`]: [`PgPostStore`] in production,
//!   [`InMemoryPostStore`] for tests and local runs), authoritative;
//! - the **cache** ([`PostCache`]), a disposable mirror over any
//!   [`CacheBackend`](crate::backend::CacheBackend).
//!
//! [`PostService`](crate::service::PostService) composes the two.
//! Users only live in the store ([`UserStore`]).
//!
//! # Error Handling
//!
//! "Absent" is `Ok(None)` or an empty `Vec`, never an error. Return `Err`
//! for connectivity failures, query errors and constraint violations.

use crate::domain::{NewPost, NewUser, Post, PostUpdate, User};
use crate::error::Result;
use async_trait::async_trait;

pub mod cached;
pub mod memory;
pub mod postgres;

pub use cached::PostCache;
pub use memory::{InMemoryPostStore, InMemoryUserStore};
pub use postgres::{PgPostStore, PgUserStore};

/// Read access to records keyed by a numeric id.
#[async_trait]
pub trait DataRepository<T: Send + 'static>: Send + Sync {
    /// Fetch one record.
    ///
    /// # Returns
    /// - `Ok(Some(entity))` - Entity found
    /// - `Ok(None)` - Entity not found (not an error)
    /// - `Err(e)` - Storage error
    async fn fetch_by_id(&self, id: i64) -> Result<Option<T>>;

    /// Batch fetch, one slot per requested id.
    ///
    /// Default implementation calls `fetch_by_id()` for each id.
    /// Override for efficiency (e.g., SQL `WHERE id = ANY(...)`, Redis MGET).
    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<Option<T>>> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.fetch_by_id(*id).await?);
        }
        Ok(results)
    }

    /// Every record, ordered by id.
    async fn fetch_all(&self) -> Result<Vec<T>>;

    /// Number of records.
    async fn count(&self) -> Result<u64> {
        Ok(self.fetch_all().await?.len() as u64)
    }
}

/// Operations shared by the post store and the post cache.
#[async_trait]
pub trait PostRepository: DataRepository<Post> {
    /// Posts owned by `user_id`, ordered by id. Empty when there are none.
    async fn fetch_all_by_user_id(&self, user_id: i64) -> Result<Vec<Post>>;

    /// Remove a post. Removing an absent id is not an error.
    async fn delete_by_id(&self, id: i64) -> Result<()>;
}

/// The authoritative post table.
#[async_trait]
pub trait PostStore: PostRepository {
    /// Persist a new post; the store assigns id and both timestamps.
    ///
    /// # Errors
    /// `Error::NotFound` if the referenced user does not exist (where the
    /// store can tell, e.g. a foreign key).
    async fn insert(&self, post: NewPost) -> Result<Post>;

    /// Replace title, content and owner of an existing post and refresh
    /// `updated_at`.
    ///
    /// # Errors
    /// `Error::NotFound` if no post has `update.id`.
    async fn update(&self, update: PostUpdate) -> Result<Post>;
}

/// The authoritative user table.
#[async_trait]
pub trait UserStore: DataRepository<User> {
    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>>;

    /// # Errors
    /// `Error::EmailInUse` if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Overwrite name and email of `user.id`.
    ///
    /// # Errors
    /// `Error::NotFound` if the user does not exist, `Error::EmailInUse` if
    /// the new email belongs to another user.
    async fn update(&self, user: User) -> Result<User>;
}
