//! Post queries for the Scribe database.

use scribe_core::db::{DatabaseError, unix_timestamp};

use super::db::ScribeDatabase;
use super::models::Post;

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.author_id, \
     u.username AS author_username, u.role AS author_role, p.created_at, p.updated_at \
     FROM posts p JOIN users u ON u.id = p.author_id";

/// Fields to change on a post; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ScribeDatabase {
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        author_id: i64,
    ) -> Result<Post, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO posts (title, content, author_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        self.get_post(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Post {id}")))
    }

    pub async fn get_post(&self, id: i64) -> Result<Option<Post>, DatabaseError> {
        let post = sqlx::query_as::<_, Post>(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(post)
    }

    /// Author of a post, or `None` if the post does not exist.
    pub async fn post_owner(&self, id: i64) -> Result<Option<i64>, DatabaseError> {
        let owner = sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(owner)
    }

    /// List posts, newest first.
    pub async fn list_posts(&self, limit: i64, offset: i64) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(posts)
    }

    pub async fn count_posts(&self) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// List one author's posts, newest first.
    pub async fn list_posts_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "{POST_SELECT} WHERE p.author_id = ? ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(author_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(posts)
    }

    pub async fn count_posts_by_author(&self, author_id: i64) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(author_id)
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    /// Apply `changes` to a post. The author is never modified.
    pub async fn update_post(
        &self,
        id: i64,
        changes: &PostChanges,
    ) -> Result<Option<Post>, DatabaseError> {
        let result = sqlx::query(
            "UPDATE posts SET title = COALESCE(?, title), content = COALESCE(?, content), updated_at = ? WHERE id = ?",
        )
        .bind(changes.title.as_deref())
        .bind(changes.content.as_deref())
        .bind(unix_timestamp())
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
