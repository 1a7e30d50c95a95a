//! Router assembly and service-level endpoints.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use scribe_core::config::PaginationConfig;
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use super::error::{ApiError, Envelope};
use super::{auth_routes, post_routes, user_routes};
use crate::auth::{JwtManager, SessionError, SessionManager};
use crate::posts::PostService;
use crate::storage::ScribeDatabase;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: ScribeDatabase,
    pub jwt: Arc<JwtManager>,
    pub sessions: SessionManager,
    pub posts: PostService,
    pub cors: CorsLayer,
}

impl AppState {
    pub fn new(
        db: ScribeDatabase,
        jwt: Arc<JwtManager>,
        pagination: PaginationConfig,
    ) -> Result<Self, SessionError> {
        let sessions = SessionManager::new(Arc::new(db.clone()), Arc::clone(&jwt))?;
        let posts = PostService::new(db.clone(), pagination);
        Ok(Self {
            db,
            jwt,
            sessions,
            posts,
            cors: cors_policy(AllowOrigin::any()),
        })
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsLayer) -> Self {
        self.cors = cors;
        self
    }
}

/// CORS policy for the configured origins. A `*` entry allows any origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, InvalidHeaderValue> {
    if origins.iter().any(|o| o == "*") {
        return Ok(cors_policy(AllowOrigin::any()));
    }
    let origins = origins
        .iter()
        .map(|o| HeaderValue::from_str(o))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cors_policy(AllowOrigin::list(origins)))
}

fn cors_policy(origin: AllowOrigin) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/auth/register", post(auth_routes::register))
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/refresh", post(auth_routes::refresh))
        .route(
            "/posts",
            get(post_routes::list_posts).post(post_routes::create_post),
        )
        .route(
            "/posts/{id}",
            get(post_routes::get_post)
                .put(post_routes::update_post)
                .delete(post_routes::delete_post),
        )
        .route(
            "/users/me",
            get(user_routes::me)
                .put(user_routes::update_me)
                .delete(user_routes::deactivate_me),
        )
        .route("/users/{id}/posts", get(user_routes::user_posts))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(state.cors.clone())
        .with_state(state)
}

/// `GET /`: API summary.
async fn index() -> impl IntoResponse {
    Envelope::ok(json!({
        "name": "Scribe",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": ["/auth/register", "/auth/login", "/auth/refresh"],
            "posts": ["/posts", "/posts/{id}"],
            "users": ["/users/me", "/users/{id}/posts"],
            "health": "/health",
        },
    }))
}

/// `GET /health`: healthy only if the database answers.
async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    match state.db.ping().await {
        Ok(()) => Ok(Envelope::ok(json!({ "status": "healthy" }))),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            Err(ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "UNHEALTHY",
                "Database unavailable",
            ))
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "METHOD_NOT_ALLOWED",
        "Method not allowed",
    )
}
