//! Pipeline error model.

use givebook_core::DomainError;
use thiserror::Error;

use crate::validate::FieldErrors;

/// How a dispatched request can fail before or inside its handler.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    /// One or more validators rejected the input; the handler never ran.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// No handler was registered for the request type.
    #[error("no handler registered for '{0}'")]
    NoHandler(&'static str),

    /// The handler ran and failed with a domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RequestError {
    /// The field errors, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
