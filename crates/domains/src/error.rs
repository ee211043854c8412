//! # AppError
//!
//! Centralized error handling for the dorm site.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or unknown bearer token, or bad login credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The bearer token was valid once but has aged out.
    #[error("session expired")]
    SessionExpired,

    /// Too many login attempts from one client.
    #[error("too many requests: {0}")]
    RateLimited(String),

    /// Validation failure (e.g., blank title, non-image upload, oversized file)
    #[error("validation error: {0}")]
    InvalidInput(String),

    /// A required external credential or destination is not configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// File, database or object-storage failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// The outbound email provider rejected or failed the send.
    #[error("delivery error: {0}")]
    Delivery(String),
}

impl AppError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    pub fn delivery(err: impl std::fmt::Display) -> Self {
        Self::Delivery(err.to_string())
    }
}

/// A specialized Result type for dorm-site logic.
pub type Result<T> = std::result::Result<T, AppError>;
