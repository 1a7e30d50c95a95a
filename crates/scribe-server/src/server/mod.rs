//! HTTP API for the Scribe server.
//!
//! Handlers translate requests into calls on [`SessionManager`](crate::auth::SessionManager)
//! and [`PostService`](crate::posts::PostService). Every response uses the
//! same JSON envelope; errors carry a stable `code`.

pub mod auth_routes;
pub mod error;
pub mod guard;
pub mod post_routes;
pub mod routes;
pub mod user_routes;

pub use error::{ApiError, Envelope};
pub use guard::{AuthUser, MaybeAuthUser};
pub use routes::{AppState, build_router, cors_layer};
