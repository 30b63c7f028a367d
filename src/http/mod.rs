//! REST surface over [`PostService`] and [`UserService`].
//!
//! ```text
//! GET    /posts              GET  /users
//! POST   /posts              POST /users
//! GET    /posts/{id}         GET  /users/{id}
//! PUT    /posts/{id}         PUT  /users/{id}
//! DELETE /posts/{id}
//! GET    /posts/user/{id}    GET  /health
//! ```

use crate::backend::CacheBackend;
use crate::repository::DataRepository;
use crate::service::{PostService, UserService};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub mod dto;
pub mod error;
mod posts;
mod users;

pub use error::ApiError;

/// Application state shared by every handler.
pub struct AppState<B: CacheBackend> {
    pub posts: Arc<PostService<B>>,
    pub users: Arc<UserService>,
}

impl<B: CacheBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        AppState {
            posts: Arc::clone(&self.posts),
            users: Arc::clone(&self.users),
        }
    }
}

impl<B: CacheBackend> AppState<B> {
    pub fn new(posts: PostService<B>, users: UserService) -> Self {
        AppState {
            posts: Arc::new(posts),
            users: Arc::new(users),
        }
    }
}

/// Build the application router.
pub fn router<B: CacheBackend>(state: AppState<B>) -> Router {
    Router::new()
        .route("/health", get(health::<B>))
        .route("/posts", get(posts::list_posts::<B>).post(posts::create_post::<B>))
        .route(
            "/posts/{id}",
            get(posts::get_post::<B>)
                .put(posts::update_post::<B>)
                .delete(posts::delete_post::<B>),
        )
        .route("/posts/user/{id}", get(posts::list_posts_by_user::<B>))
        .route("/users", get(users::list_users::<B>).post(users::create_user::<B>))
        .route(
            "/users/{id}",
            get(users::get_user::<B>).put(users::update_user::<B>),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub cache: &'static str,
}

fn component_status(ok: bool) -> &'static str {
    if ok {
        "up"
    } else {
        "down"
    }
}

/// Liveness of the store and the cache. Always 200; the body says which
/// component is down.
async fn health<B: CacheBackend>(State(state): State<AppState<B>>) -> Json<HealthResponse> {
    let store_ok = match state.posts.store().count().await {
        Ok(_) => true,
        Err(e) => {
            warn!("Store health check failed: {}", e);
            false
        }
    };
    let cache_ok = match state.posts.cache().backend().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!("Cache health check failed: {}", e);
            false
        }
    };

    Json(HealthResponse {
        status: if store_ok && cache_ok { "healthy" } else { "degraded" },
        store: component_status(store_ok),
        cache: component_status(cache_ok),
    })
}
