//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures. Infrastructure
/// concerns (staging, commit, relation resolution) belong to the store layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required input (entity, id, field) was absent or malformed. Caller bug.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested identifier has no matching, non-deleted record.
    #[error("not found")]
    NotFound,

    /// An operation was invoked in a state that forbids it. Programming error,
    /// fatal to the current request.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A domain invariant failed after validation passed (uniqueness, limit).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A value failed a domain-level validation rule.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
