//! Storage layer tests for Scribe.

use scribe_core::Role;

use super::db::ScribeDatabase;
use super::queries_posts::PostChanges;
use crate::auth::{IdentityStore, NewIdentity, ResourceStore, StoreError};

async fn test_db() -> ScribeDatabase {
    ScribeDatabase::open_in_memory().await.unwrap()
}

async fn seed_user(db: &ScribeDatabase, username: &str) -> i64 {
    db.create_user(username, &format!("{username}@example.com"), "hash", "user")
        .await
        .unwrap()
        .id
}

fn identity(username: &str, email: &str) -> NewIdentity {
    NewIdentity {
        username: username.to_string(),
        email: email.to_string(),
    }
}

// === User tests ===

#[tokio::test]
async fn create_and_get_user() {
    let db = test_db().await;
    let user = db
        .create_user("alice", "alice@example.com", "hash123", "user")
        .await
        .unwrap();

    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, "user");
    assert!(user.is_active);

    let fetched = db.get_user(user.id).await.unwrap();
    assert_eq!(fetched.username, "alice");
}

#[tokio::test]
async fn identifier_matches_username_or_email() {
    let db = test_db().await;
    let id = seed_user(&db, "alice").await;

    let by_name = db.find_user_by_identifier("alice").await.unwrap().unwrap();
    let by_email = db
        .find_user_by_identifier("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, id);
    assert_eq!(by_email.id, id);
    assert!(db.find_user_by_identifier("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn user_updates_touch_only_existing_rows() {
    let db = test_db().await;
    let id = seed_user(&db, "alice").await;

    assert!(
        db.update_user_account(id, Some("new@example.com"), Some("hash2"))
            .await
            .unwrap()
    );
    assert!(db.set_user_active(id, false).await.unwrap());

    let user = db.get_user(id).await.unwrap();
    assert_eq!(user.email, "new@example.com");
    assert_eq!(user.password_hash, "hash2");
    assert!(!user.is_active);

    assert!(!db.set_user_active(9999, false).await.unwrap());
}

// === Identity store tests ===

#[tokio::test]
async fn duplicate_username_is_reported_by_field() {
    let db = test_db().await;
    db.insert(&identity("john_doe", "john@example.com"), "h", Role::User)
        .await
        .unwrap();

    let err = db
        .insert(&identity("john_doe", "other@example.com"), "h", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { ref field } if field == "username"));
}

#[tokio::test]
async fn duplicate_email_is_reported_by_field() {
    let db = test_db().await;
    db.insert(&identity("john_doe", "john@example.com"), "h", Role::User)
        .await
        .unwrap();

    let err = db
        .insert(&identity("jane_doe", "john@example.com"), "h", Role::User)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { ref field } if field == "email"));
}

#[tokio::test]
async fn stored_role_round_trips() {
    let db = test_db().await;
    let id = db
        .insert(&identity("root", "root@example.com"), "h", Role::Admin)
        .await
        .unwrap();

    let found = db.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(found.role, Role::Admin);

    let cred = db.find_by_identifier("root").await.unwrap().unwrap();
    assert_eq!(cred.identity.id, id);
    assert_eq!(cred.secret_hash, "h");
}

#[tokio::test]
async fn unknown_stored_role_is_data_integrity_error() {
    let db = test_db().await;
    let id = seed_user(&db, "alice").await;
    sqlx::query("UPDATE users SET role = 'superuser' WHERE id = ?")
        .bind(id)
        .execute(db.pool())
        .await
        .unwrap();

    assert!(matches!(
        db.find_by_id(id).await,
        Err(StoreError::DataIntegrity(_))
    ));
    assert!(matches!(
        db.find_by_identifier("alice").await,
        Err(StoreError::DataIntegrity(_))
    ));
}

#[tokio::test]
async fn updating_missing_identity_is_not_found() {
    let db = test_db().await;
    assert!(matches!(
        db.update_account(42, Some("x@example.com"), None).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn account_update_is_all_or_nothing() {
    let db = test_db().await;
    seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;

    let err = db
        .update_account(bob, Some("alice@example.com"), Some("new-hash"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate { ref field } if field == "email"));

    let user = db.get_user(bob).await.unwrap();
    assert_eq!(user.email, "bob@example.com");
    assert_eq!(user.password_hash, "hash");

    db.update_account(bob, None, Some("new-hash")).await.unwrap();
    let user = db.get_user(bob).await.unwrap();
    assert_eq!(user.email, "bob@example.com");
    assert_eq!(user.password_hash, "new-hash");
}

// === Post tests ===

#[tokio::test]
async fn create_and_get_post_includes_author() {
    let db = test_db().await;
    let author = seed_user(&db, "alice").await;

    let post = db
        .create_post("Hello", "A first post body", author)
        .await
        .unwrap();
    assert_eq!(post.author_id, author);
    assert_eq!(post.author_username, "alice");
    assert_eq!(post.author_role, "user");

    let fetched = db.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Hello");
    assert!(db.get_post(post.id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn list_posts_newest_first_with_paging() {
    let db = test_db().await;
    let author = seed_user(&db, "alice").await;
    for i in 0..5 {
        db.create_post(&format!("Post {i}"), "Some long enough body", author)
            .await
            .unwrap();
    }

    assert_eq!(db.count_posts().await.unwrap(), 5);
    let first_page = db.list_posts(2, 0).await.unwrap();
    let titles: Vec<_> = first_page.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Post 4", "Post 3"]);

    let last_page = db.list_posts(2, 4).await.unwrap();
    assert_eq!(last_page.len(), 1);
    assert_eq!(last_page[0].title, "Post 0");
}

#[tokio::test]
async fn list_posts_by_author_filters() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice").await;
    let bob = seed_user(&db, "bob").await;
    db.create_post("Alice's", "Some long enough body", alice)
        .await
        .unwrap();
    db.create_post("Bob's", "Some long enough body", bob)
        .await
        .unwrap();

    let posts = db.list_posts_by_author(bob, 10, 0).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Bob's");
    assert_eq!(db.count_posts_by_author(alice).await.unwrap(), 1);
}

#[tokio::test]
async fn update_post_keeps_unset_fields() {
    let db = test_db().await;
    let author = seed_user(&db, "alice").await;
    let post = db
        .create_post("Title", "Original body text", author)
        .await
        .unwrap();

    let changes = PostChanges {
        title: Some("New title".into()),
        content: None,
    };
    let updated = db.update_post(post.id, &changes).await.unwrap().unwrap();
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.content, "Original body text");
    assert_eq!(updated.author_id, author);

    assert!(db.update_post(9999, &changes).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_post_and_owner_lookup() {
    let db = test_db().await;
    let author = seed_user(&db, "alice").await;
    let post = db
        .create_post("Title", "Some long enough body", author)
        .await
        .unwrap();

    assert_eq!(db.find_owner_id(post.id).await.unwrap(), Some(author));
    assert!(db.delete_post(post.id).await.unwrap());
    assert!(!db.delete_post(post.id).await.unwrap());
    assert_eq!(db.find_owner_id(post.id).await.unwrap(), None);
}

#[tokio::test]
async fn ping_succeeds() {
    test_db().await.ping().await.unwrap();
}
