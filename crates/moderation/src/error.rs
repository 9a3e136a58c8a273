//! Error taxonomy surfaced to the HTTP layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jumuiya_core::DomainError;

use crate::store::StoreError;

/// What kind of failure occurred; callers branch on this, not on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    Internal,
}

impl ErrorKind {
    /// Suggested response status.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Validation => 400,
            ErrorKind::Internal => 500,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModerationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ModerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Concurrency { .. }
            | StoreError::UniqueViolation(_)
            | StoreError::AlreadyResolved(_) => {
                ModerationError::Domain(DomainError::conflict(err.to_string()))
            }
            StoreError::Missing(what) => ModerationError::Domain(DomainError::not_found(what)),
            StoreError::Backend(_) => ModerationError::Store(err),
        }
    }
}

impl ModerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModerationError::Domain(DomainError::Unauthorized) => ErrorKind::Unauthorized,
            ModerationError::Domain(DomainError::Forbidden(_)) => ErrorKind::Forbidden,
            ModerationError::Domain(DomainError::NotFound(_)) => ErrorKind::NotFound,
            ModerationError::Domain(DomainError::Conflict(_)) => ErrorKind::Conflict,
            ModerationError::Domain(DomainError::Validation(_) | DomainError::InvalidId(_)) => {
                ErrorKind::Validation
            }
            ModerationError::Store(_) => ErrorKind::Internal,
        }
    }
}
