//! Bearer token guard.
//!
//! [`AuthUser`] requires a valid access token whose account still exists
//! and is active; [`MaybeAuthUser`] accepts anonymous callers for routes
//! that are public but may use the caller's identity.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use scribe_core::Principal;

use super::error::ApiError;
use super::routes::AppState;
use crate::auth::TokenKind;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(ApiError::missing_token)
}

/// Caller authenticated with an access token, checked against the
/// account's current state.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let principal = state.sessions.authenticate(token).await?;
        Ok(Self(principal))
    }
}

/// Caller identity if a valid access token was presented.
///
/// A missing or unusable token yields an anonymous caller, never a rejection.
/// Only the token is checked; public routes do not consult the account.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let principal = bearer_token(&parts.headers)
            .ok()
            .and_then(|token| state.jwt.verify(token, TokenKind::Access).ok());
        Ok(Self(principal))
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_missing_token() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code, "MISSING_TOKEN");
    }

    #[test]
    fn wrong_scheme_is_missing_token() {
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }
}
