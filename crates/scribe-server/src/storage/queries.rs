//! User queries for the Scribe database.

use scribe_core::db::{DatabaseError, unix_timestamp};

use super::db::ScribeDatabase;
use super::models::User;

impl ScribeDatabase {
    /// Create a new user. Fails with `UniqueViolation` if the username or
    /// email is taken.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(result.last_insert_rowid()).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<User, DatabaseError> {
        self.find_user(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Find a user whose username or email equals `identifier`.
    ///
    /// A username match is preferred over an email match.
    pub async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ? OR email = ? \
             ORDER BY CASE WHEN username = ? THEN 0 ELSE 1 END LIMIT 1",
        )
        .bind(identifier)
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    /// Change a user's email and/or password hash in a single statement.
    /// `None` keeps the current value. Returns false if the user does not
    /// exist.
    pub async fn update_user_account(
        &self,
        id: i64,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET email = COALESCE(?, email), password_hash = COALESCE(?, password_hash), updated_at = ? WHERE id = ?",
        )
        .bind(email)
        .bind(password_hash)
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn set_user_active(&self, id: i64, active: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
            .bind(active)
            .bind(unix_timestamp())
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
