//! SQLite storage for the Scribe server.
//!
//! Provides persistence for users and posts, and implements the
//! [`IdentityStore`](crate::auth::IdentityStore) and
//! [`ResourceStore`](crate::auth::ResourceStore) seams.

mod db;
mod models;
mod queries;
mod queries_posts;
mod store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests;

pub use db::ScribeDatabase;
pub use models::*;
pub use queries_posts::PostChanges;
pub use scribe_core::db::DatabaseError;
