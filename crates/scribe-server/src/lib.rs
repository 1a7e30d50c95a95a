//! Scribe Server Library
//!
//! Core functionality for the Scribe blog backend:
//! - SQLite storage for users and posts
//! - JWT token lifecycle and password hashing
//! - Post service gated by the ownership policy
//! - HTTP API (axum) with a bearer-token guard

pub mod auth;
pub mod posts;
pub mod server;
pub mod storage;
