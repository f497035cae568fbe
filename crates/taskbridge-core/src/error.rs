//! Error types shared across Task Bridge interfaces.

use thiserror::Error;

/// Errors returned by a task repository implementation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The request never got a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// An insert succeeded at the HTTP level but returned no row.
    #[error("store returned no {0} record")]
    NoRecord(&'static str),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is not set.
    #[error("{0} not set. Add it to the environment or {1}")]
    Missing(&'static str, String),

    /// A setting is present but unusable.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
