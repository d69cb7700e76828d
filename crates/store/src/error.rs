//! Store error model.

use givebook_core::{DomainError, RecordId};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by the persistence substrate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A required input (entity, id, page bound) was absent or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No matching, non-deleted record for the identifier.
    #[error("{record} {id} not found")]
    NotFound { record: &'static str, id: RecordId },

    /// An insert targeted an identifier that already exists.
    #[error("{record} {id} already exists")]
    DuplicateId { record: &'static str, id: RecordId },

    /// An `includes` entry named a relation the record does not define.
    #[error("{record} has no relation named '{relation}'")]
    UnknownRelation {
        record: &'static str,
        relation: String,
    },

    /// Transaction state machine misuse (commit without begin, double commit).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The storage backend itself failed (poisoned lock and the like).
    #[error("storage backend: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidArgument(msg) => DomainError::InvalidArgument(msg),
            StoreError::NotFound { .. } => DomainError::NotFound,
            StoreError::DuplicateId { record, id } => {
                DomainError::conflict(format!("{record} {id} already exists"))
            }
            StoreError::UnknownRelation { record, relation } => DomainError::invalid_argument(
                format!("{record} has no relation named '{relation}'"),
            ),
            StoreError::InvalidState(msg) => DomainError::InvalidState(msg),
            StoreError::Backend(msg) => DomainError::invalid_state(format!("storage backend: {msg}")),
        }
    }
}
