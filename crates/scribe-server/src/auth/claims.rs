//! JWT claims structure for Scribe auth.

use std::fmt;

use scribe_core::{Principal, Role};
use serde::{Deserialize, Serialize};

/// Purpose of a token. A token of one kind is never accepted where the
/// other is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, presented on every protected call.
    Access,
    /// Long-lived, only exchanged for a new access token.
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims embedded in access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (decimal user ID).
    pub sub: String,
    /// Role at issue time.
    pub role: Role,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    pub token_type: TokenKind,
}

impl Claims {
    /// Numeric subject id, if `sub` is well formed.
    pub fn subject_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn principal(&self) -> Option<Principal> {
        self.subject_id().map(|id| Principal::new(id, self.role))
    }
}
