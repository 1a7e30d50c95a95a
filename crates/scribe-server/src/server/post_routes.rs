//! `/posts` endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use super::error::{ApiError, Envelope};
use super::guard::{AuthUser, MaybeAuthUser};
use super::routes::AppState;
use crate::storage::PostChanges;

/// `?page=&per_page=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// `GET /posts`
pub async fn list_posts(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(q) = query?;
    let page = state.posts.page_request(q.page, q.per_page)?;
    let posts = state.posts.list(principal.as_ref(), page).await?;
    Ok(Envelope::ok(posts))
}

/// `GET /posts/{id}`
pub async fn get_post(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let post = state.posts.get(principal.as_ref(), id).await?;
    Ok(Envelope::ok(post))
}

/// `POST /posts`
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let post = state
        .posts
        .create(Some(&principal), &req.title, &req.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_message(post, "Post created successfully"),
    ))
}

/// `PUT /posts/{id}`
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(req) = payload?;
    let changes = PostChanges {
        title: req.title,
        content: req.content,
    };
    let post = state.posts.update(&principal, id, changes).await?;
    Ok(Envelope::with_message(post, "Post updated successfully"))
}

/// `DELETE /posts/{id}`
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.posts.delete(&principal, id).await?;
    Ok(Envelope::with_message((), "Post deleted successfully"))
}
