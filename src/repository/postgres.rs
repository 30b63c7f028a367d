//! PostgreSQL stores (SQLx).
//!
//! Pure data access: no cache logic. Constraint violations are translated by
//! `From<sqlx::Error>`: the email unique key becomes `Error::EmailInUse`, the
//! post owner foreign key becomes `Error::NotFound`.

use super::{DataRepository, PostRepository, PostStore, UserStore};
use crate::domain::{NewPost, NewUser, Post, PostUpdate, User};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;

/// Schema migrations embedded at compile time from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

const POST_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, first_name, last_name, email";

/// Open a connection pool and bring the schema up to date.
///
/// # Errors
/// `Error::RepositoryError` if the database is unreachable or a migration
/// fails.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    info!("✓ Database connection established");

    MIGRATOR.run(&pool).await?;
    info!("✓ Migrations completed");

    Ok(pool)
}

#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataRepository<Post> for PgPostStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM post WHERE id = $1", POST_COLUMNS);
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn fetch_by_ids(&self, ids: &[i64]) -> Result<Vec<Option<Post>>> {
        let sql = format!("SELECT {} FROM post WHERE id = ANY($1)", POST_COLUMNS);
        let rows = sqlx::query_as::<_, Post>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_id: HashMap<i64, Post> = rows.into_iter().map(|p| (p.id, p)).collect();
        Ok(ids.iter().map(|id| by_id.remove(id)).collect())
    }

    async fn fetch_all(&self) -> Result<Vec<Post>> {
        let sql = format!("SELECT {} FROM post ORDER BY id", POST_COLUMNS);
        Ok(sqlx::query_as::<_, Post>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl PostRepository for PgPostStore {
    async fn fetch_all_by_user_id(&self, user_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM post WHERE user_id = $1 ORDER BY id",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM post WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: NewPost) -> Result<Post> {
        let sql = format!(
            "INSERT INTO post (title, content, user_id) VALUES ($1, $2, $3) RETURNING {}",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.user_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, update: PostUpdate) -> Result<Post> {
        let sql = format!(
            "UPDATE post SET title = $2, content = $3, user_id = $4, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Post>(&sql)
            .bind(update.id)
            .bind(&update.title)
            .bind(&update.content)
            .bind(update.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Post not found with ID: {}", update.id)))?;
        tx.commit().await?;

        Ok(updated)
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataRepository<User> for PgUserStore {
    async fn fetch_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM app_user WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn fetch_all(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {} FROM app_user ORDER BY id", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM app_user WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO app_user (first_name, last_name, email) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, user: User) -> Result<User> {
        let sql = format!(
            "UPDATE app_user SET first_name = $2, last_name = $3, email = $4 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found.".to_string()))
    }
}
