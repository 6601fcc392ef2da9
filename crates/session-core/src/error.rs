//! Error types for session-core.
//!
//! None of these escape `SessionProvider::initialize` or `SessionProvider::logout`;
//! they are reported through outcome values and log fields.

use thiserror::Error;

/// Failures reported by an [`IdentityService`](crate::identity::IdentityService).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The service has no session for this client
    #[error("no active session")]
    NoSession,

    /// The request never produced a response (DNS, TLS, connection reset, timeout)
    #[error("identity service request failed: {0}")]
    Transport(String),

    /// The service answered with a status the client does not handle
    #[error("identity service returned {status}: {message}")]
    Unexpected { status: u16, message: String },

    /// The response body could not be decoded
    #[error("invalid identity service response: {0}")]
    Decode(String),
}

impl IdentityError {
    /// Convenience constructor for transport errors.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Convenience constructor for decode errors.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Failures reported by a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Backing storage is missing or disabled (private browsing, no window)
    #[error("storage not available: {0}")]
    Unavailable(String),

    /// A read or write against a specific key failed
    #[error("storage operation on '{key}' failed: {message}")]
    Operation { key: String, message: String },
}

impl StorageError {
    pub fn operation(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Operation {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

/// Recoverable session failures. Every variant degrades to the anonymous state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session check failed; treated as "logged out"
    #[error("no active session: {0}")]
    NoActiveSession(#[source] IdentityError),

    /// Delete-session call failed (double logout, network); local cleanup still runs
    #[error("logout failed: {0}")]
    LogoutFailure(#[source] IdentityError),

    /// Cache write or removal failed
    #[error("session cache error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
