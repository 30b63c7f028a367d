//! In-memory stores.
//!
//! Behave like the Postgres tables (sequential ids from 1, server-assigned
//! timestamps, unique emails) without a database. Used by the tests and by
//! `STORE_BACKEND=memory` for local runs.

use super::{DataRepository, PostRepository, PostStore, UserStore};
use crate::domain::{NewPost, NewUser, Post, PostUpdate, User};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows plus the next id to hand out.
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory post table. Clones share the same rows.
///
/// Does not know about users; owner existence is checked by the service.
#[derive(Clone, Default)]
pub struct InMemoryPostStore {
    table: Arc<RwLock<Table<Post>>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of posts.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Return true if the table holds no posts.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

#[async_trait]
impl DataRepository<Post> for InMemoryPostStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<Option<Post>>> {
        let table = self.table.read().await;
        Ok(ids.iter().map(|id| table.rows.get(id).cloned()).collect())
    }

    async fn fetch_all(&self) -> Result<Vec<Post>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.table.read().await.rows.len() as u64)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostStore {
    async fn fetch_all_by_user_id(&self, user_id: i64) -> Result<Vec<Post>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.table.write().await.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let created = Post {
            id: table.allocate_id(),
            title: post.title,
            content: post.content,
            user_id: post.user_id,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, update: PostUpdate) -> Result<Post> {
        let mut table = self.table.write().await;
        let existing = table
            .rows
            .get_mut(&update.id)
            .ok_or_else(|| Error::NotFound(format!("Post not found with ID: {}", update.id)))?;

        existing.title = update.title;
        existing.content = update.content;
        existing.user_id = update.user_id;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }
}

/// In-memory user table with a unique email constraint.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<Table<User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of users.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Return true if the table holds no users.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

fn email_taken(table: &Table<User>, email: &str, except_id: Option<i64>) -> bool {
    table
        .rows
        .values()
        .any(|u| u.email == email && Some(u.id) != except_id)
}

#[async_trait]
impl DataRepository<User> for InMemoryUserStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn fetch_all(&self) -> Result<Vec<User>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut table = self.table.write().await;
        if email_taken(&table, &user.email, None) {
            return Err(Error::EmailInUse("Email already in use".to_string()));
        }

        let created = User {
            id: table.allocate_id(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, user: User) -> Result<User> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&user.id) {
            return Err(Error::NotFound("User not found.".to_string()));
        }
        if email_taken(&table, &user.email, Some(user.id)) {
            return Err(Error::EmailInUse("Email already in use".to_string()));
        }

        table.rows.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(user_id: i64, title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "0123456789".to_string(),
            user_id,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Juan".to_string(),
            last_name: "Gonzales".to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_post_insert_assigns_sequential_ids() {
        let store = InMemoryPostStore::new();

        let first = store.insert(new_post(1, "a")).await.expect("insert");
        let second = store.insert(new_post(1, "b")).await.expect("insert");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.count().await.expect("count"), 2);
    }

    #[tokio::test]
    async fn test_post_update_keeps_created_at() {
        let store = InMemoryPostStore::new();
        let created = store.insert(new_post(1, "before")).await.expect("insert");

        let updated = store
            .update(PostUpdate {
                id: created.id,
                title: "after".to_string(),
                content: "new content here".to_string(),
                user_id: 2,
            })
            .await
            .expect("update");

        assert_eq!(updated.title, "after");
        assert_eq!(updated.user_id, 2);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_post_update_missing_is_not_found() {
        let store = InMemoryPostStore::new();
        let result = store
            .update(PostUpdate {
                id: 9,
                title: "x".to_string(),
                content: "0123456789".to_string(),
                user_id: 1,
            })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_post_fetch_by_user_and_batch() {
        let store = InMemoryPostStore::new();
        store.insert(new_post(1, "a")).await.expect("insert");
        store.insert(new_post(2, "b")).await.expect("insert");
        store.insert(new_post(1, "c")).await.expect("insert");

        let owned = store.fetch_all_by_user_id(1).await.expect("fetch");
        assert_eq!(owned.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(store.fetch_all_by_user_id(3).await.expect("fetch").is_empty());

        let batch = store.fetch_by_ids(&[2, 7]).await.expect("batch");
        assert!(batch[0].is_some());
        assert!(batch[1].is_none());
    }

    #[tokio::test]
    async fn test_post_delete() {
        let store = InMemoryPostStore::new();
        let created = store.insert(new_post(1, "a")).await.expect("insert");

        store.delete_by_id(created.id).await.expect("delete");
        store.delete_by_id(created.id).await.expect("delete absent");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("a@b.com")).await.expect("insert");

        let result = store.insert(new_user("a@b.com")).await;
        assert!(matches!(result, Err(Error::EmailInUse(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_update() {
        let store = InMemoryUserStore::new();
        let juan = store.insert(new_user("a@b.com")).await.expect("insert");
        store.insert(new_user("c@d.com")).await.expect("insert");

        let renamed = store
            .update(User {
                first_name: "John".to_string(),
                ..juan.clone()
            })
            .await
            .expect("update");
        assert_eq!(renamed.first_name, "John");

        let stolen = store
            .update(User {
                email: "c@d.com".to_string(),
                ..juan
            })
            .await;
        assert!(matches!(stolen, Err(Error::EmailInUse(_))));

        let missing = store
            .update(User {
                id: 99,
                first_name: "x".to_string(),
                last_name: "y".to_string(),
                email: "z@z.com".to_string(),
            })
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_user_fetch_by_email() {
        let store = InMemoryUserStore::new();
        let created = store.insert(new_user("a@b.com")).await.expect("insert");

        let found = store.fetch_by_email("a@b.com").await.expect("fetch");
        assert_eq!(found, Some(created));
        assert!(store.fetch_by_email("x@y.com").await.expect("fetch").is_none());
    }
}
