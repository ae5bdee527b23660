//! Errors surfaced to facade callers.
//!
//! Transport details never leak past the facade: remote failures either fall
//! back or become `Unavailable`, local failures map onto the kinds below.

use thiserror::Error;

use crate::backend::{InvalidSourceType, LocalError};
use crate::search::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("listing service unavailable: {0}")]
    Unavailable(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(LocalError),
}

impl From<LocalError> for ServiceError {
    fn from(err: LocalError) -> Self {
        match err {
            LocalError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            LocalError::Validation(msg) => ServiceError::Validation(msg),
            other => ServiceError::Backend(other),
        }
    }
}

impl From<InvalidSourceType> for ServiceError {
    fn from(err: InvalidSourceType) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl From<SearchError> for ServiceError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidParams(msg) => ServiceError::Validation(msg),
            SearchError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}
