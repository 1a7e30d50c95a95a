//! `/auth` endpoints: register, login, refresh.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, Envelope};
use super::guard::bearer_token;
use super::routes::AppState;
use crate::auth::{Identity, IssuedToken, Session};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Identity,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user: session.identity,
            expires_in: session.access.expires_in(),
            access_token: session.access.token,
            refresh_token: session.refresh.token,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for AccessTokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            expires_in: token.expires_in(),
            access_token: token.token,
            token_type: "Bearer",
        }
    }
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let session = state
        .sessions
        .register(&req.username, &req.email, &req.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::with_message(
            SessionResponse::from(session),
            "User registered successfully",
        ),
    ))
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let session = state.sessions.login(&req.username, &req.password).await?;
    Ok(Envelope::with_message(
        SessionResponse::from(session),
        "Login successful",
    ))
}

/// `POST /auth/refresh` with `Authorization: Bearer <refresh token>`.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&headers)?;
    let access = state.sessions.refresh(token).await?;
    Ok(Envelope::ok(AccessTokenResponse::from(access)))
}
