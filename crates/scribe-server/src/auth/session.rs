//! Session lifecycle: register, login, refresh and account maintenance.
//!
//! Sessions are stateless. A login produces an access/refresh token pair;
//! refresh trades a valid refresh token for a new access token and leaves
//! the refresh token untouched. Expiry is the only invalidation.

use std::sync::Arc;

use scribe_core::validation::{self, ValidationError};
use scribe_core::{Principal, Role};
use tracing::{info, instrument, warn};

use super::claims::TokenKind;
use super::jwt::{IssuedToken, JwtManager, TokenError};
use super::password;
use super::store::{Identity, IdentityStore, NewIdentity, StoreError};

/// Lifecycle failures. Token and validation errors pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A user with this {field} already exists")]
    DuplicateIdentifier { field: String },

    /// Unknown identifier or wrong password. The two are not distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("User not found")]
    UserNotFound,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { field } => Self::DuplicateIdentifier { field },
            StoreError::NotFound(_) => Self::UserNotFound,
            StoreError::DataIntegrity(msg) => Self::DataIntegrity(msg),
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

/// Result of a successful register or login.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub identity: Identity,
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Drives the session state machine against an [`IdentityStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn IdentityStore>,
    jwt: Arc<JwtManager>,
    /// Verified against when the identifier is unknown, so both login
    /// failure paths do the same hashing work.
    dummy_hash: Arc<str>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn IdentityStore>, jwt: Arc<JwtManager>) -> Result<Self, SessionError> {
        let dummy_hash = password::hash_password("scribe-dummy-password")
            .map_err(|e| SessionError::Hashing(e.to_string()))?;
        Ok(Self {
            store,
            jwt,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Create a `user` account and log it in.
    #[instrument(skip(self, email, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let identity = self
            .create_account(username, email, password, Role::User)
            .await?;
        info!(user_id = identity.id, username = %identity.username, "User registered");
        self.issue_session(identity)
    }

    /// Create an `admin` account. Used by the CLI; no tokens are issued.
    #[instrument(skip(self, email, password))]
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, SessionError> {
        let identity = self
            .create_account(username, email, password, Role::Admin)
            .await?;
        info!(user_id = identity.id, username = %identity.username, "Admin created");
        Ok(identity)
    }

    /// Log in by username or email.
    ///
    /// The password is checked before the active flag, so a disabled
    /// account is only reported to a caller who knows its password.
    #[instrument(skip(self, identifier, password))]
    pub async fn login(&self, identifier: &str, password: &str) -> Result<Session, SessionError> {
        let identifier = identifier.trim().to_lowercase();
        let credential = self.store.find_by_identifier(&identifier).await?;

        let Some(credential) = credential else {
            // Result is irrelevant; only the cost matters.
            let _ = verify_blocking(password, &self.dummy_hash).await;
            warn!("Failed login attempt");
            return Err(SessionError::InvalidCredentials);
        };

        if !verify_blocking(password, &credential.secret_hash).await? {
            warn!(user_id = credential.identity.id, "Failed login attempt");
            return Err(SessionError::InvalidCredentials);
        }
        if !credential.identity.is_active {
            warn!(user_id = credential.identity.id, "Login to disabled account");
            return Err(SessionError::AccountDisabled);
        }

        info!(user_id = credential.identity.id, "User logged in");
        self.issue_session(credential.identity)
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The new token carries the subject and role from the refresh token.
    /// The subject must still exist and be active.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, SessionError> {
        let principal = self.jwt.verify(refresh_token, TokenKind::Refresh)?;

        let identity = self
            .store
            .find_by_id(principal.id)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;
        if !identity.is_active {
            warn!(user_id = principal.id, "Refresh for disabled account");
            return Err(SessionError::AccountDisabled);
        }

        let access = self
            .jwt
            .issue(principal.id, principal.role, TokenKind::Access)?;
        info!(user_id = principal.id, "Access token refreshed");
        Ok(access)
    }

    /// Resolve an access token to its caller.
    ///
    /// The token alone is not enough: its subject must still exist and be
    /// active. The role comes from the token, as on refresh.
    pub async fn authenticate(&self, access_token: &str) -> Result<Principal, SessionError> {
        let principal = self.jwt.verify(access_token, TokenKind::Access)?;

        let identity = self
            .store
            .find_by_id(principal.id)
            .await?
            .ok_or(SessionError::InvalidCredentials)?;
        if !identity.is_active {
            warn!(user_id = principal.id, "Request from disabled account");
            return Err(SessionError::AccountDisabled);
        }
        Ok(principal)
    }

    pub async fn profile(&self, id: i64) -> Result<Identity, SessionError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(SessionError::UserNotFound)
    }

    /// Change email and/or password. Both are validated and the password
    /// hashed before a single store write, so a failure changes nothing.
    #[instrument(skip(self, email, password))]
    pub async fn update_profile(
        &self,
        id: i64,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Identity, SessionError> {
        let email = email.map(validation::normalize_email).transpose()?;
        let hash = match password {
            Some(password) => {
                validation::check_password_strength(password)?;
                Some(hash_blocking(password.to_string()).await?)
            }
            None => None,
        };

        if email.is_some() || hash.is_some() {
            self.store
                .update_account(id, email.as_deref(), hash.as_deref())
                .await?;
        }

        info!(user_id = id, "Profile updated");
        self.profile(id).await
    }

    /// Mark an account inactive. Outstanding tokens are not revoked, but
    /// every later login, refresh and authenticated call is refused.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i64) -> Result<(), SessionError> {
        self.store.set_active(id, false).await?;
        info!(user_id = id, "Account deactivated");
        Ok(())
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Identity, SessionError> {
        let new = NewIdentity {
            username: validation::normalize_username(username)?,
            email: validation::normalize_email(email)?,
        };
        validation::check_password_strength(password)?;

        let hash = hash_blocking(password.to_string()).await?;
        // Uniqueness is enforced by the store on insert; a lost race
        // surfaces here as `DuplicateIdentifier`.
        let id = self.store.insert(&new, &hash, role).await?;

        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| SessionError::DataIntegrity(format!("user {id} vanished after insert")))
    }

    fn issue_session(&self, identity: Identity) -> Result<Session, SessionError> {
        let principal = Principal::new(identity.id, identity.role);
        let access = self
            .jwt
            .issue(principal.id, principal.role, TokenKind::Access)?;
        let refresh = self
            .jwt
            .issue(principal.id, principal.role, TokenKind::Refresh)?;
        Ok(Session {
            principal,
            identity,
            access,
            refresh,
        })
    }
}

async fn verify_blocking(password: &str, hash: &str) -> Result<bool, SessionError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| SessionError::Hashing(e.to_string()))?
        .map_err(|e| SessionError::Hashing(e.to_string()))
}

async fn hash_blocking(password: String) -> Result<String, SessionError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| SessionError::Hashing(e.to_string()))?
        .map_err(|e| SessionError::Hashing(e.to_string()))
}
