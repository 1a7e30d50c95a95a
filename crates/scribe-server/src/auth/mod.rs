//! Authentication module for Scribe.
//!
//! Provides JWT token management, password hashing, the identity/resource
//! store seams and the session lifecycle built on top of them.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod session;
pub mod store;

pub use claims::{Claims, TokenKind};
pub use jwt::{IssuedToken, JwtManager, TokenError};
pub use session::{Session, SessionError, SessionManager};
pub use store::{Credential, Identity, IdentityStore, NewIdentity, ResourceStore, StoreError};
