//! Error types for libearth-cli

use thiserror::Error;

/// Result type alias for libearth-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in libearth-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the libearth crates
    #[error(transparent)]
    Core(#[from] libearth_core::Error),

    /// A query path does not lead to a value
    #[error("Invalid query path {path:?}: {message}")]
    Query {
        /// The path as given
        path: String,
        /// Why it cannot be followed
        message: String,
    },

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new query path error.
    pub fn query<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Error::Query {
            path: path.into(),
            message: message.into(),
        }
    }
}
