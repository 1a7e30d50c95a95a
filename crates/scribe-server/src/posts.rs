//! Post service: CRUD on posts, gated by the authorization policy.

use scribe_core::config::PaginationConfig;
use scribe_core::validation::{self, PageRequest, ValidationError};
use scribe_core::{Action, Principal, decide};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::{ResourceStore, StoreError};
use crate::storage::{DatabaseError, Post, PostChanges, ScribeDatabase};

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Post {0} not found")]
    NotFound(i64),

    #[error("User {0} not found")]
    AuthorNotFound(i64),

    #[error("Not allowed to {0} this post")]
    Forbidden(Action),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<DatabaseError> for PostError {
    fn from(e: DatabaseError) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<StoreError> for PostError {
    fn from(e: StoreError) -> Self {
        Self::Store(e.to_string())
    }
}

/// Author summary embedded in each post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorBrief {
    pub id: i64,
    pub username: String,
    pub role: String,
}

/// Post as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub author: AuthorBrief,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            author: AuthorBrief {
                id: post.author_id,
                username: post.author_username,
                role: post.author_role,
            },
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: i64,
}

#[derive(Clone)]
pub struct PostService {
    db: ScribeDatabase,
    pagination: PaginationConfig,
}

impl PostService {
    pub const fn new(db: ScribeDatabase, pagination: PaginationConfig) -> Self {
        Self { db, pagination }
    }

    /// Validate raw `page`/`per_page` query values against the configured limits.
    pub fn page_request(
        &self,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> Result<PageRequest, PostError> {
        Ok(PageRequest::new(
            page,
            per_page,
            self.pagination.default_page_size,
            self.pagination.max_page_size,
        )?)
    }

    /// All posts, newest first.
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        authorize(principal, Action::Read, None)?;
        let total = self.db.count_posts().await?;
        let items = self.db.list_posts(page.limit(), page.offset()).await?;
        Ok(into_page(items, total, page))
    }

    /// One author's posts, newest first.
    pub async fn list_by_author(
        &self,
        principal: Option<&Principal>,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Page<PostView>, PostError> {
        authorize(principal, Action::Read, Some(author_id))?;
        if self.db.find_user(author_id).await?.is_none() {
            return Err(PostError::AuthorNotFound(author_id));
        }
        let total = self.db.count_posts_by_author(author_id).await?;
        let items = self
            .db
            .list_posts_by_author(author_id, page.limit(), page.offset())
            .await?;
        Ok(into_page(items, total, page))
    }

    pub async fn get(&self, principal: Option<&Principal>, id: i64) -> Result<PostView, PostError> {
        let post = self.db.get_post(id).await?.ok_or(PostError::NotFound(id))?;
        authorize(principal, Action::Read, Some(post.author_id))?;
        Ok(post.into())
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        title: &str,
        content: &str,
    ) -> Result<PostView, PostError> {
        authorize(principal, Action::Create, None)?;
        let Some(author) = principal else {
            return Err(PostError::Forbidden(Action::Create));
        };
        validation::check_title(title)?;
        validation::check_content(content)?;

        let post = self.db.create_post(title.trim(), content, author.id).await?;
        info!(post_id = post.id, author_id = author.id, "Post created");
        Ok(post.into())
    }

    /// Edit a post. Only its author may; admins get no override here.
    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        changes: PostChanges,
    ) -> Result<PostView, PostError> {
        let owner = self.owner_of(id).await?;
        authorize(Some(principal), Action::Update, Some(owner))?;

        if let Some(title) = &changes.title {
            validation::check_title(title)?;
        }
        if let Some(content) = &changes.content {
            validation::check_content(content)?;
        }
        let changes = PostChanges {
            title: changes.title.map(|t| t.trim().to_string()),
            content: changes.content,
        };

        let post = self
            .db
            .update_post(id, &changes)
            .await?
            .ok_or(PostError::NotFound(id))?;
        info!(post_id = id, user_id = principal.id, "Post updated");
        Ok(post.into())
    }

    /// Delete a post. Allowed for its author and for admins.
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), PostError> {
        let owner = self.owner_of(id).await?;
        authorize(Some(principal), Action::Delete, Some(owner))?;

        if !self.db.delete_post(id).await? {
            return Err(PostError::NotFound(id));
        }
        info!(post_id = id, user_id = principal.id, owner_id = owner, "Post deleted");
        Ok(())
    }

    async fn owner_of(&self, id: i64) -> Result<i64, PostError> {
        ResourceStore::find_owner_id(&self.db, id)
            .await?
            .ok_or(PostError::NotFound(id))
    }
}

fn authorize(
    principal: Option<&Principal>,
    action: Action,
    owner_id: Option<i64>,
) -> Result<(), PostError> {
    if decide(principal, action, owner_id).is_allowed() {
        return Ok(());
    }
    warn!(
        user_id = principal.map(|p| p.id),
        %action,
        owner_id,
        "Authorization denied"
    );
    Err(PostError::Forbidden(action))
}

fn into_page(items: Vec<Post>, total: i64, page: PageRequest) -> Page<PostView> {
    Page {
        items: items.into_iter().map(PostView::from).collect(),
        total,
        page: page.page,
        per_page: page.per_page,
        pages: page.pages_for(total),
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use scribe_core::Role;

    use super::*;

    const BODY: &str = "A body that is long enough";

    async fn setup() -> (PostService, i64, i64) {
        let db = ScribeDatabase::open_in_memory().await.unwrap();
        let alice = db
            .create_user("alice", "alice@example.com", "h", "user")
            .await
            .unwrap()
            .id;
        let bob = db
            .create_user("bob", "bob@example.com", "h", "user")
            .await
            .unwrap()
            .id;
        (PostService::new(db, PaginationConfig::default()), alice, bob)
    }

    fn user(id: i64) -> Principal {
        Principal::new(id, Role::User)
    }

    fn admin(id: i64) -> Principal {
        Principal::new(id, Role::Admin)
    }

    #[tokio::test]
    async fn anonymous_can_read_but_not_create() {
        let (posts, alice, _) = setup().await;
        let post = posts.create(Some(&user(alice)), "Hello", BODY).await.unwrap();

        let fetched = posts.get(None, post.id).await.unwrap();
        assert_eq!(fetched.author.username, "alice");

        let err = posts.create(None, "Hello", BODY).await.unwrap_err();
        assert!(matches!(err, PostError::Forbidden(Action::Create)));
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let (posts, alice, _) = setup().await;
        let p = user(alice);

        assert!(matches!(
            posts.create(Some(&p), "   ", BODY).await,
            Err(PostError::Validation(_))
        ));
        assert!(matches!(
            posts.create(Some(&p), "Title", "short").await,
            Err(PostError::Validation(_))
        ));
        let long_title = "x".repeat(201);
        assert!(matches!(
            posts.create(Some(&p), &long_title, BODY).await,
            Err(PostError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_may_update_even_against_admin() {
        let (posts, alice, bob) = setup().await;
        let post = posts.create(Some(&user(alice)), "Title", BODY).await.unwrap();
        let changes = PostChanges {
            title: Some("Edited".into()),
            content: None,
        };

        let err = posts
            .update(&user(bob), post.id, changes.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden(Action::Update)));

        let err = posts
            .update(&admin(bob), post.id, changes.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden(Action::Update)));

        let updated = posts.update(&user(alice), post.id, changes).await.unwrap();
        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.content, BODY);
    }

    #[tokio::test]
    async fn admin_may_delete_any_post() {
        let (posts, alice, bob) = setup().await;
        let post = posts.create(Some(&user(alice)), "Title", BODY).await.unwrap();

        let err = posts.delete(&user(bob), post.id).await.unwrap_err();
        assert!(matches!(err, PostError::Forbidden(Action::Delete)));

        posts.delete(&admin(bob), post.id).await.unwrap();
        assert!(matches!(
            posts.get(None, post.id).await,
            Err(PostError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn owner_may_delete() {
        let (posts, alice, _) = setup().await;
        let post = posts.create(Some(&user(alice)), "Title", BODY).await.unwrap();
        posts.delete(&user(alice), post.id).await.unwrap();
    }

    #[tokio::test]
    async fn missing_post_is_not_found_before_authorization() {
        let (posts, alice, _) = setup().await;
        let changes = PostChanges::default();
        assert!(matches!(
            posts.update(&user(alice), 404, changes).await,
            Err(PostError::NotFound(404))
        ));
        assert!(matches!(
            posts.delete(&admin(alice), 404).await,
            Err(PostError::NotFound(404))
        ));
    }

    #[tokio::test]
    async fn update_validates_changed_fields() {
        let (posts, alice, _) = setup().await;
        let post = posts.create(Some(&user(alice)), "Title", BODY).await.unwrap();
        let changes = PostChanges {
            title: None,
            content: Some("tiny".into()),
        };
        assert!(matches!(
            posts.update(&user(alice), post.id, changes).await,
            Err(PostError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_paginated() {
        let (posts, alice, bob) = setup().await;
        for i in 0..3 {
            posts
                .create(Some(&user(alice)), &format!("A{i}"), BODY)
                .await
                .unwrap();
        }
        posts.create(Some(&user(bob)), "B0", BODY).await.unwrap();

        let page = posts
            .list(None, posts.page_request(Some(1), Some(3)).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].title, "B0");

        let by_alice = posts
            .list_by_author(None, alice, posts.page_request(None, None).unwrap())
            .await
            .unwrap();
        assert_eq!(by_alice.total, 3);
        assert_eq!(by_alice.per_page, 10);
        assert!(by_alice.items.iter().all(|p| p.author_id == alice));
    }

    #[tokio::test]
    async fn listing_unknown_author_is_not_found() {
        let (posts, _, _) = setup().await;
        let page = posts.page_request(None, None).unwrap();
        assert!(matches!(
            posts.list_by_author(None, 999, page).await,
            Err(PostError::AuthorNotFound(999))
        ));
    }
}
