//! `Scribe` Core Library
//!
//! Shared functionality for the `Scribe` blog backend:
//! - Authorization decision engine for post ownership
//! - Password strength policy and input validation
//! - Configuration resolution
//! - `SQLite` pool helpers and tracing setup

pub mod config;
pub mod db;
pub mod error;
pub mod policy;
pub mod tracing_init;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use policy::{Action, Decision, Principal, Role, decide};
