//! JWT token issuance and validation.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use scribe_core::config::MAX_TOKEN_TTL_SECS;
use scribe_core::db::unix_timestamp;
use scribe_core::{Config, Principal, Role};

use super::claims::{Claims, TokenKind};

/// Token codec failures.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Missing/empty secret or an out-of-range TTL. Fatal at startup.
    #[error("Token configuration error: {0}")]
    Config(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Expected a {expected} token but got a {actual} token")]
    KindMismatch {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// A freshly signed token and its validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub kind: TokenKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl IssuedToken {
    /// Lifetime in seconds.
    pub const fn expires_in(&self) -> i64 {
        self.expires_at - self.issued_at
    }
}

/// Manages JWT token creation and validation.
///
/// Holds no mutable state; share it behind an `Arc` across request tasks.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret.
    pub fn new(secret: &[u8], access_ttl_secs: i64, refresh_ttl_secs: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Config("signing secret is unset or empty".into()));
        }
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            return Err(TokenError::Config("token TTLs must be positive".into()));
        }
        if access_ttl_secs.max(refresh_ttl_secs) > MAX_TOKEN_TTL_SECS {
            return Err(TokenError::Config(format!(
                "token TTLs must not exceed {MAX_TOKEN_TTL_SECS}s"
            )));
        }

        // Expiry is checked by hand in `verify_at` so the check has no
        // leeway and can run against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl_secs,
            refresh_ttl_secs,
        })
    }

    /// Build from the resolved process configuration.
    pub fn from_config(config: &Config) -> Result<Self, TokenError> {
        let secret = config
            .jwt_secret()
            .map_err(|e| TokenError::Config(e.to_string()))?;
        Self::new(
            secret.as_bytes(),
            config.auth.access_ttl_secs,
            config.auth.refresh_ttl_secs,
        )
    }

    /// Configured lifetime for tokens of `kind`.
    pub const fn ttl_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Issue a token of `kind` with the configured TTL.
    pub fn issue(&self, subject_id: i64, role: Role, kind: TokenKind) -> Result<IssuedToken, TokenError> {
        self.issue_with_ttl(subject_id, role, kind, self.ttl_for(kind))
    }

    /// Issue a token with an explicit TTL.
    pub fn issue_with_ttl(
        &self,
        subject_id: i64,
        role: Role,
        kind: TokenKind,
        ttl_secs: i64,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject_id, role, kind, ttl_secs, unix_timestamp())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject_id: i64,
        role: Role,
        kind: TokenKind,
        ttl_secs: i64,
        now: i64,
    ) -> Result<IssuedToken, TokenError> {
        if ttl_secs <= 0 {
            return Err(TokenError::Config(format!("token TTL must be positive, got {ttl_secs}")));
        }
        let exp = now.checked_add(ttl_secs).ok_or_else(|| {
            TokenError::Config(format!("token TTL {ttl_secs}s overflows the expiry time"))
        })?;

        let claims = Claims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: subject_id.to_string(),
            role,
            iat: now,
            exp,
            token_type: kind,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        Ok(IssuedToken {
            token,
            kind,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Verify a token of the expected kind and return its principal.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Principal, TokenError> {
        self.verify_at(token, expected, unix_timestamp())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Checks run in order: signature, expiry (`now >= exp` is expired),
    /// kind. An expired token therefore always reports `Expired`, whatever
    /// its kind.
    pub fn verify_at(&self, token: &str, expected: TokenKind, now: i64) -> Result<Principal, TokenError> {
        let claims = self.decode_claims(token)?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }
        if claims.token_type != expected {
            return Err(TokenError::KindMismatch {
                expected,
                actual: claims.token_type,
            });
        }

        claims
            .principal()
            .ok_or_else(|| TokenError::Malformed(format!("non-numeric subject '{}'", claims.sub)))
    }

    /// Check the signature and decode claims without any time or kind checks.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const DAY: i64 = 24 * 60 * 60;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing", 3600, 7 * DAY).unwrap()
    }

    #[test]
    fn issue_and_verify_access_token() {
        let jwt = test_jwt();
        let issued = jwt.issue(1, Role::User, TokenKind::Access).unwrap();
        assert_eq!(issued.expires_in(), 3600);

        let principal = jwt.verify(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(principal, Principal::new(1, Role::User));
    }

    #[test]
    fn round_trip_preserves_subject_and_role() {
        let jwt = test_jwt();
        let now = unix_timestamp();
        for (id, role) in [(1, Role::User), (42, Role::Admin), (i64::MAX, Role::User)] {
            for kind in [TokenKind::Access, TokenKind::Refresh] {
                for ttl in [1, 60, 30 * DAY] {
                    let issued = jwt.issue_at(id, role, kind, ttl, now).unwrap();
                    let principal = jwt.verify_at(&issued.token, kind, now).unwrap();
                    assert_eq!(principal, Principal::new(id, role));
                    assert!(issued.expires_at > issued.issued_at);
                }
            }
        }
    }

    #[test]
    fn expired_at_exact_expiry() {
        let jwt = test_jwt();
        let issued = jwt.issue_at(1, Role::User, TokenKind::Access, 60, 1_000).unwrap();

        assert!(jwt.verify_at(&issued.token, TokenKind::Access, 1_059).is_ok());
        assert!(matches!(
            jwt.verify_at(&issued.token, TokenKind::Access, 1_060),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn expired_wins_over_kind_mismatch() {
        let jwt = test_jwt();
        let issued = jwt.issue_at(1, Role::User, TokenKind::Refresh, 60, 1_000).unwrap();
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            assert!(matches!(
                jwt.verify_at(&issued.token, kind, 5_000),
                Err(TokenError::Expired)
            ));
        }
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let jwt = test_jwt();
        let issued = jwt.issue(1, Role::User, TokenKind::Refresh).unwrap();
        let err = jwt.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(matches!(
            err,
            TokenError::KindMismatch {
                expected: TokenKind::Access,
                actual: TokenKind::Refresh
            }
        ));
    }

    #[test]
    fn access_token_rejected_as_refresh() {
        let jwt = test_jwt();
        let issued = jwt.issue(1, Role::User, TokenKind::Access).unwrap();
        assert!(matches!(
            jwt.verify(&issued.token, TokenKind::Refresh),
            Err(TokenError::KindMismatch { .. })
        ));
    }

    #[test]
    fn refresh_ttl_seven_days() {
        let jwt = test_jwt();
        let issued_at = 1_700_000_000;
        let issued = jwt.issue_at(7, Role::User, TokenKind::Refresh, 7 * DAY, issued_at).unwrap();

        let day6 = jwt.verify_at(&issued.token, TokenKind::Refresh, issued_at + 6 * DAY);
        assert_eq!(day6.unwrap().id, 7);

        let day8 = jwt.verify_at(&issued.token, TokenKind::Refresh, issued_at + 8 * DAY);
        assert!(matches!(day8, Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret", 3600, 86400).unwrap();

        let issued = jwt1.issue(1, Role::User, TokenKind::Access).unwrap();
        assert!(matches!(
            jwt2.verify(&issued.token, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn swapped_signature_fails() {
        let jwt = test_jwt();
        let user = jwt.issue(1, Role::User, TokenKind::Access).unwrap();
        let admin = jwt.issue(1, Role::Admin, TokenKind::Access).unwrap();

        // user's header+payload, admin's signature
        let (user_body, _) = user.token.rsplit_once('.').unwrap();
        let (_, admin_sig) = admin.token.rsplit_once('.').unwrap();
        let forged = format!("{user_body}.{admin_sig}");

        assert!(matches!(
            jwt.verify(&forged, TokenKind::Access),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let jwt = test_jwt();
        assert!(matches!(
            jwt.verify("not-a-valid-token", TokenKind::Access),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn tokens_are_url_safe_and_unique() {
        let jwt = test_jwt();
        let a = jwt.issue_at(1, Role::User, TokenKind::Access, 60, 1_000).unwrap();
        let b = jwt.issue_at(1, Role::User, TokenKind::Access, 60, 1_000).unwrap();
        assert_ne!(a.token, b.token);
        assert!(a
            .token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')));
    }

    #[test]
    fn empty_secret_is_config_error() {
        assert!(matches!(
            JwtManager::new(b"", 3600, 86400),
            Err(TokenError::Config(_))
        ));
    }

    #[test]
    fn non_positive_ttl_is_config_error() {
        assert!(matches!(JwtManager::new(b"s", 0, 86400), Err(TokenError::Config(_))));
        let jwt = test_jwt();
        assert!(matches!(
            jwt.issue_with_ttl(1, Role::User, TokenKind::Access, -5),
            Err(TokenError::Config(_))
        ));
    }

    #[test]
    fn oversized_ttl_is_config_error_not_overflow() {
        let jwt = test_jwt();
        assert!(matches!(
            jwt.issue_at(1, Role::User, TokenKind::Refresh, i64::MAX, 1_000),
            Err(TokenError::Config(_))
        ));
        assert!(matches!(
            JwtManager::new(b"secret", 900, i64::MAX),
            Err(TokenError::Config(_))
        ));
        assert!(JwtManager::new(b"secret", 900, MAX_TOKEN_TTL_SECS).is_ok());
    }

    #[test]
    fn from_config_uses_configured_ttls() {
        let mut config = Config::default();
        config.auth.jwt_secret = Some("cfg-secret".into());
        config.auth.access_ttl_secs = 120;
        let jwt = JwtManager::from_config(&config).unwrap();
        assert_eq!(jwt.ttl_for(TokenKind::Access), 120);
        assert_eq!(jwt.ttl_for(TokenKind::Refresh), 7 * DAY);

        config.auth.jwt_secret = Some(String::new());
        assert!(matches!(JwtManager::from_config(&config), Err(TokenError::Config(_))));
    }
}
