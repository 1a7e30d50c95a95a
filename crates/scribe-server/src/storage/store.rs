//! `IdentityStore` and `ResourceStore` backed by [`ScribeDatabase`].

use std::str::FromStr;

use async_trait::async_trait;
use scribe_core::Role;
use scribe_core::db::DatabaseError;

use super::db::ScribeDatabase;
use super::models::User;
use crate::auth::{Credential, Identity, IdentityStore, NewIdentity, ResourceStore, StoreError};

impl From<DatabaseError> for StoreError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::UniqueViolation(field) => Self::Duplicate { field },
            DatabaseError::NotFound(what) => Self::NotFound(what),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl TryFrom<User> for Credential {
    type Error = StoreError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        let role = Role::from_str(&user.role).map_err(|e| {
            StoreError::DataIntegrity(format!("user {}: {e}", user.id))
        })?;
        Ok(Self {
            identity: Identity {
                id: user.id,
                username: user.username,
                email: user.email,
                role,
                is_active: user.is_active,
                created_at: user.created_at,
            },
            secret_hash: user.password_hash,
        })
    }
}

fn require_row(updated: bool, id: i64) -> Result<(), StoreError> {
    if updated {
        Ok(())
    } else {
        Err(StoreError::NotFound(format!("User {id}")))
    }
}

#[async_trait]
impl IdentityStore for ScribeDatabase {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Credential>, StoreError> {
        self.find_user_by_identifier(identifier)
            .await?
            .map(Credential::try_from)
            .transpose()
    }

    async fn insert(
        &self,
        identity: &NewIdentity,
        secret_hash: &str,
        role: Role,
    ) -> Result<i64, StoreError> {
        let user = self
            .create_user(&identity.username, &identity.email, secret_hash, role.as_str())
            .await?;
        Ok(user.id)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Identity>, StoreError> {
        let Some(user) = self.find_user(id).await? else {
            return Ok(None);
        };
        Credential::try_from(user).map(|c| Some(c.identity))
    }

    async fn update_account(
        &self,
        id: i64,
        email: Option<&str>,
        secret_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        require_row(self.update_user_account(id, email, secret_hash).await?, id)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<(), StoreError> {
        require_row(self.set_user_active(id, active).await?, id)
    }
}

#[async_trait]
impl ResourceStore for ScribeDatabase {
    async fn find_owner_id(&self, resource_id: i64) -> Result<Option<i64>, StoreError> {
        Ok(self.post_owner(resource_id).await?)
    }
}
