//! `/users` endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;

use super::error::{ApiError, Envelope};
use super::guard::{AuthUser, MaybeAuthUser};
use super::post_routes::PageQuery;
use super::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `GET /users/me`
pub async fn me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let identity = state.sessions.profile(principal.id).await?;
    Ok(Envelope::ok(identity))
}

/// `PUT /users/me`
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let identity = state
        .sessions
        .update_profile(principal.id, req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Envelope::with_message(identity, "Profile updated successfully"))
}

/// `DELETE /users/me`
pub async fn deactivate_me(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.deactivate(principal.id).await?;
    Ok(Envelope::with_message((), "Account deactivated"))
}

/// `GET /users/{id}/posts`
pub async fn user_posts(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Query(q) = query?;
    let page = state.posts.page_request(q.page, q.per_page)?;
    let posts = state.posts.list_by_author(principal.as_ref(), id, page).await?;
    Ok(Envelope::ok(posts))
}
