//! Storage seams consumed by the session lifecycle and the post service.
//!
//! The SQLite implementation lives in [`crate::storage`]; tests may supply
//! their own.

use async_trait::async_trait;
use scribe_core::Role;
use serde::Serialize;

/// Failures reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. `field` names the column.
    #[error("Duplicate value for {field}")]
    Duplicate { field: String },

    /// The row to update does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored value could not be mapped into the domain (e.g. unknown role).
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Identifier fields supplied at registration, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
}

/// A stored account, without its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: i64,
}

/// An account together with its password hash.
#[derive(Debug, Clone)]
pub struct Credential {
    pub identity: Identity,
    pub secret_hash: String,
}

/// Accounts and their credentials.
///
/// Implementations must enforce identifier uniqueness atomically: a second
/// concurrent `insert` with a taken username or email fails with
/// [`StoreError::Duplicate`] rather than succeeding.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up by username or email (both already lowercase).
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert a new account and return its id.
    async fn insert(
        &self,
        identity: &NewIdentity,
        secret_hash: &str,
        role: Role,
    ) -> Result<i64, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError>;

    /// Change email and/or secret. Both changes land together or not at
    /// all; `None` leaves a field untouched.
    async fn update_account(
        &self,
        id: i64,
        email: Option<&str>,
        secret_hash: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<(), StoreError>;
}

/// Ownership lookups for posts.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Owner of the resource, or `None` if it does not exist.
    async fn find_owner_id(&self, resource_id: i64) -> Result<Option<i64>, StoreError>;
}
