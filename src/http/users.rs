//! `/users` handlers.

use super::dto::{UserDto, UserRequest};
use super::error::Result;
use super::AppState;
use crate::backend::CacheBackend;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

pub async fn list_users<B: CacheBackend>(
    State(state): State<AppState<B>>,
) -> Result<Json<Vec<UserDto>>> {
    let users = state.users.find_all().await?;
    Ok(Json(users.into_iter().map(UserDto::from).collect()))
}

pub async fn get_user<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<UserDto>> {
    let Path(id) = path?;
    Ok(Json(state.users.find_by_id(id).await?.into()))
}

pub async fn create_user<B: CacheBackend>(
    State(state): State<AppState<B>>,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload?;
    let user = state.users.create(request.validate()?).await?;

    let location = format!("/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserDto::from(user)),
    ))
}

pub async fn update_user<B: CacheBackend>(
    State(state): State<AppState<B>>,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserDto>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let user = state.users.update(id, request.validate()?).await?;
    Ok(Json(user.into()))
}
