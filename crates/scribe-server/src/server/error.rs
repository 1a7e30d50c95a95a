//! Error mapping and the response envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scribe_core::validation::ValidationError;
use serde::Serialize;
use tracing::error;

use crate::auth::{SessionError, TokenError};
use crate::posts::PostError;

/// Successful response body: `{"success": true, "data": ..., "message"?}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: None,
        })
    }

    pub fn with_message(data: T, message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: Some(message),
        })
    }
}

/// A failed request, rendered as `{"success": false, "error": ..., "code": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn missing_token() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "MISSING_TOKEN",
            "Authorization token is required",
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Log `detail` and return a generic 500.
    pub fn internal(detail: &impl std::fmt::Display) -> Self {
        error!(error = %detail, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        let unauthorized = |code, message: &str| Self::new(StatusCode::UNAUTHORIZED, code, message);
        match e {
            TokenError::Expired => unauthorized("TOKEN_EXPIRED", "Token has expired"),
            TokenError::InvalidSignature => {
                unauthorized("INVALID_SIGNATURE", "Token signature is invalid")
            }
            TokenError::KindMismatch { .. } => {
                unauthorized("TOKEN_KIND_MISMATCH", &e.to_string())
            }
            TokenError::Malformed(_) => unauthorized("MALFORMED_TOKEN", "Token is malformed"),
            TokenError::Config(_) | TokenError::Encoding(_) => Self::internal(&e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        let code = match e {
            ValidationError::WeakPassword(_) => "WEAK_PASSWORD",
            ValidationError::Invalid { .. } => "VALIDATION_ERROR",
        };
        Self::new(StatusCode::BAD_REQUEST, code, e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Token(e) => e.into(),
            SessionError::Validation(e) => e.into(),
            SessionError::DuplicateIdentifier { .. } => {
                Self::new(StatusCode::CONFLICT, "DUPLICATE_IDENTIFIER", e.to_string())
            }
            SessionError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", e.to_string())
            }
            SessionError::AccountDisabled => {
                Self::new(StatusCode::FORBIDDEN, "ACCOUNT_DISABLED", e.to_string())
            }
            SessionError::UserNotFound => Self::not_found(e.to_string()),
            SessionError::Store(_) | SessionError::Hashing(_) | SessionError::DataIntegrity(_) => {
                Self::internal(&e)
            }
        }
    }
}

impl From<PostError> for ApiError {
    fn from(e: PostError) -> Self {
        match e {
            PostError::NotFound(_) | PostError::AuthorNotFound(_) => Self::not_found(e.to_string()),
            PostError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", e.to_string()),
            PostError::Validation(e) => e.into(),
            PostError::Store(_) => Self::internal(&e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}
