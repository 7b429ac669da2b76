use crate::session::SessionIdError;

use thiserror::Error;

/// Result type alias for skillgate-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the skill activation middleware
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session-related errors
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Skill catalog construction errors (startup-fatal)
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Skill bundle and session-state errors
    #[error("skill error: {0}")]
    Skill(String),

    /// Provider errors
    #[error("provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("tool error: {0}")]
    Tool(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true for errors that must abort process startup.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Config(_))
    }
}

/// Session-specific errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session not found
    #[error("session not found: {0}")]
    NotFound(String),

    /// Invalid session ID
    #[error("invalid session ID: {0}")]
    InvalidId(String),

    /// Session already exists
    #[error("session already exists: {0}")]
    AlreadyExists(String),
}

impl From<SessionIdError> for Error {
    fn from(err: SessionIdError) -> Self {
        Error::Session(SessionError::InvalidId(err.to_string()))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML parse error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
