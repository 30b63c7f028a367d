//! # posts-api
//!
//! A posts and users REST service with a cache-aside post cache.
//!
//! ## Layers
//!
//! - **Stores** ([`repository::PostStore`], [`repository::UserStore`]): the
//!   system of record. PostgreSQL through SQLx in production, in-memory
//!   tables for tests and local runs.
//! - **Post cache** ([`repository::PostCache`]): a disposable mirror of the
//!   post table over any [`CacheBackend`] (in-memory or Redis). Values are
//!   Postcard-encoded inside a versioned envelope.
//! - **Services** ([`service::PostService`], [`service::UserService`]):
//!   cache-aside reads, write-through mirroring, existence checks.
//! - **HTTP** ([`http::router`]): an axum router with problem+json errors.
//!
//! ## Quick Start
//!
//! ```no_run
//! use posts_api::backend::InMemoryBackend;
//! use posts_api::http::{router, AppState};
//! use posts_api::repository::{InMemoryPostStore, InMemoryUserStore, PostCache};
//! use posts_api::service::{PostService, UserService};
//! use std::sync::Arc;
//!
//! # async fn run() -> std::io::Result<()> {
//! let users = Arc::new(InMemoryUserStore::new());
//! let posts = PostService::new(
//!     Arc::new(InMemoryPostStore::new()),
//!     PostCache::new(InMemoryBackend::new()),
//!     users.clone(),
//! );
//! let app = router(AppState::new(posts, UserService::new(users)));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod domain;
pub mod entity;
pub mod error;
pub mod http;
pub mod key;
pub mod observability;
pub mod repository;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use entity::CacheEntity;
pub use error::{Error, Result};
pub use repository::{DataRepository, PostRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
