//! Error types for `Scribe` core library.

use thiserror::Error;

/// Result type alias using `Scribe` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `Scribe` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored value does not fit the closed set the logic expects.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// An authorization action name outside the known set.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}
