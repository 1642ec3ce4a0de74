//! Error types crossing the crate boundary
//!
//! Only two kinds of failure leave the client pipeline: a malformed
//! environment value, and a client that could not be constructed.
//! Provisioning problems are logged and absorbed in [`crate::provision`].

use thiserror::Error;

/// A recognized environment variable holds a value that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: expected a boolean (true/false/yes/no/1/0), got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var}: expected a non-negative integer, got '{value}'")]
    InvalidInteger { var: &'static str, value: String },

    #[error("{var}: expected a port number (1-65535), got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var}: invalid JSON: {reason}")]
    InvalidJson { var: &'static str, reason: String },

    #[error("{var}: '{value}' is not one of: {expected}")]
    InvalidChoice {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to construct Chroma client: {0}")]
    ClientConstruction(String),

    #[error("reset is disabled (set CHROMA_ALLOW_RESET=true to enable)")]
    ResetNotAllowed,

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("invalid collection name: {0}")]
    InvalidCollectionName(String),

    #[error("Chroma backend error: {0}")]
    Backend(String),
}

impl Error {
    pub(crate) fn construction(err: impl std::fmt::Display) -> Self {
        Error::ClientConstruction(err.to_string())
    }

    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Error::Backend(err.to_string())
    }
}

/// Result alias for fallible client operations
pub type Result<T> = std::result::Result<T, Error>;
