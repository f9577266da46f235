//! Unified error types for the connection service.

use thiserror::Error;

/// Top-level error type for the connection service.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be resolved, read, parsed, or validated.
    #[error("config: {0}")]
    Config(String),

    /// The wallet-connection project identifier is missing or empty.
    #[error("project id is not defined")]
    MissingProjectId,

    /// A wallet connector could not be built or refused a request.
    #[error("connector: {0}")]
    Connector(String),

    /// Persisted session data could not be encoded or decoded.
    #[error("storage: {0}")]
    Storage(String),

    /// Server bind or runtime error.
    #[error("server: {0}")]
    Server(String),
}

impl Error {
    /// Configuration error with a plain message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Configuration error wrapping an underlying cause.
    pub fn config_with(msg: impl AsRef<str>, source: impl std::fmt::Display) -> Self {
        Self::Config(format!("{}: {source}", msg.as_ref()))
    }

    /// Connector error with a plain message.
    pub fn connector(msg: impl Into<String>) -> Self {
        Self::Connector(msg.into())
    }

    /// Connector error wrapping an underlying cause.
    pub fn connector_with(msg: impl AsRef<str>, source: impl std::fmt::Display) -> Self {
        Self::Connector(format!("{}: {source}", msg.as_ref()))
    }

    /// Storage error wrapping an underlying cause.
    pub fn storage_with(msg: impl AsRef<str>, source: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{}: {source}", msg.as_ref()))
    }
}
