//! # AppError
//!
//! Centralized error handling for MiningHub.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all mh-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Thread, Event, Project)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Validation failure (e.g., blank reply, title too short)
    #[error("{0}")]
    ValidationError(String),

    /// Admin code missing or wrong
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down)
    #[error("internal service error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        AppError::NotFound(kind, id.to_string())
    }
}

/// A specialized Result type for MiningHub logic.
pub type Result<T> = std::result::Result<T, AppError>;
