use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque session identifier supplied by the orchestrator.
///
/// The middleware never interprets the contents; it only requires the id to be
/// non-empty and printable so it can be used as a map key and in log fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh id from the current timestamp and a process-local counter
    pub fn generate() -> Self {
        let now = chrono::Utc::now();
        let seq = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{}-{:04}", now.format("%Y-%m-%dT%H-%M-%SZ"), seq))
    }

    /// Wrap an externally produced token (HTTP session, socket id, ...)
    pub fn parse(raw: impl Into<String>) -> Result<Self, SessionIdError> {
        let raw = raw.into();
        Self::validate(&raw)?;
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(raw: &str) -> Result<(), SessionIdError> {
        if raw.trim().is_empty() {
            return Err(SessionIdError::Empty);
        }
        if raw.chars().any(|c| c.is_control()) {
            return Err(SessionIdError::InvalidFormat);
        }
        Ok(())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Errors that can occur when creating or parsing SessionId
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdError {
    /// Id string is empty or whitespace
    Empty,
    /// Id contains control characters
    InvalidFormat,
}

impl fmt::Display for SessionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionIdError::Empty => write!(f, "SessionId cannot be empty"),
            SessionIdError::InvalidFormat => write!(f, "SessionId contains control characters"),
        }
    }
}

impl std::error::Error for SessionIdError {}
