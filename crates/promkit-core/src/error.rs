//! Shared error type across promkit crates.

use thiserror::Error;

/// Stable error categories (part of the public API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid name, label, bucket layout, objective, or argument.
    InvalidArgument,
    /// Registration collides with an existing collector.
    Conflict,
    /// The exposition sink failed.
    Io,
    /// Anything else (unreadable config file, ...).
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::Io => "IO",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PromError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum PromError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal: {0}")]
    Internal(String),
}

impl PromError {
    /// Map an error to its stable category.
    pub fn code(&self) -> ErrorCode {
        match self {
            PromError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            PromError::Conflict(_) => ErrorCode::Conflict,
            PromError::Io(_) => ErrorCode::Io,
            PromError::Internal(_) => ErrorCode::Internal,
        }
    }
}
