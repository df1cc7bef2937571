//! Structured error types for tracker operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    InvalidInput,
    InvalidAmount,

    // Lookup errors (id prefix resolution only)
    TaskNotFound,
    AmbiguousId,

    // Environment errors
    PersistenceError,
    ConfigError,
}

/// Structured error carried through the library and rendered by the CLI.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct TrackerError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TrackerError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn empty_text() -> Self {
        Self::new(ErrorCode::InvalidInput, "Task text must not be empty").with_field("text")
    }

    pub fn invalid_amount(amount: i64) -> Self {
        Self::new(
            ErrorCode::InvalidAmount,
            format!("XP award must be positive, got {}", amount),
        )
        .with_field("amount")
    }

    pub fn task_not_found(id: &str) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {}", id))
    }

    pub fn ambiguous_id(prefix: &str, matches: &[String]) -> Self {
        Self::new(
            ErrorCode::AmbiguousId,
            format!("Task id prefix '{}' is ambiguous", prefix),
        )
        .with_details(format!("matches: {}", matches.join(", ")))
    }

    pub fn persistence(key: &str, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::PersistenceError,
            format!("Failed to persist '{}': {}", key, err),
        )
        .with_field(key)
    }

    pub fn config(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ConfigError, err.to_string())
    }

    /// Whether the CLI should treat this as a user-facing validation message.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidInput | ErrorCode::TaskNotFound | ErrorCode::AmbiguousId
        )
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TrackerError>() {
            Ok(tracker_err) => tracker_err,
            Err(err) => TrackerError::config(err),
        }
    }
}

/// Result type for tracker operations.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
