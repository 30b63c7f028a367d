//! `/posts` handlers.

use super::dto::{CreatePostRequest, PostResponse, UpdatePostRequest};
use super::error::Result;
use super::AppState;
use crate::backend::CacheBackend;
use crate::domain::Post;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

async fn respond<B: CacheBackend>(state: &AppState<B>, post: Post) -> Result<PostResponse> {
    let author = state.posts.author(&post).await?;
    Ok(PostResponse::new(post, author))
}

pub async fn list_posts<B: CacheBackend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<PostResponse>>> {
    let posts = state.posts.find_all().await?;

    let mut body = Vec::with_capacity(posts.len());
    for post in posts {
        // A post whose owner cannot be resolved is still listed.
        let author = match state.posts.author(&post).await {
            Ok(author) => author,
            Err(e) => {
                warn!("Could not resolve owner of post {}: {}", post.id, e);
                None
            }
        };
        body.push(PostResponse::new(post, author));
    }
    Ok(Json(body))
}

pub async fn get_post<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<PostResponse>> {
    let Path(id) = path?;
    let post = state.posts.find_by_id(id).await?;
    Ok(Json(respond(&state, post).await?))
}

pub async fn list_posts_by_user<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<PostResponse>>> {
    let Path(user_id) = path?;
    let posts = state.posts.find_all_by_user_id(user_id).await?;

    let author = state.users.find_by_id(user_id).await.ok();
    Ok(Json(
        posts
            .into_iter()
            .map(|post| PostResponse::new(post, author.clone()))
            .collect(),
    ))
}

pub async fn create_post<B: CacheBackend>(
    State(state): State<AppState<B>>,
    payload: std::result::Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload?;
    let post = state.posts.create(request.validate()?).await?;

    let location = format!("/posts/{}", post.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(respond(&state, post).await?),
    ))
}

pub async fn update_post<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<PostResponse>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let post = state.posts.update(request.validate(id)?).await?;
    Ok(Json(respond(&state, post).await?))
}

pub async fn delete_post<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    state.posts.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
