//! Shared primitives for all Rust crates in the PR card assistant.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across PR card assistant crates.
pub type AppResult<T> = Result<T, AppError>;

/// A UTF-8 string whose character count lies within a fixed range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundedString(String);

impl BoundedString {
    /// Creates a validated string holding between `min_chars` and `max_chars`
    /// characters (inclusive). `field` names the value in the error message.
    pub fn new(
        field: &str,
        value: impl Into<String>,
        min_chars: usize,
        max_chars: usize,
    ) -> AppResult<Self> {
        let value = value.into();
        let length = value.chars().count();
        if length < min_chars || length > max_chars {
            return Err(AppError::Validation(format!(
                "{field} must be between {min_chars} and {max_chars} characters, got {length}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input, malformed payload or an unreadable document.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller exceeded the allowed request rate.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
