//! Orchestration of stores and the post cache.
//!
//! Services are cheap to share: wrap them in `Arc` once at startup and hand
//! clones to request handlers.

mod post_service;
mod user_service;

pub use post_service::PostService;
pub use user_service::UserService;
