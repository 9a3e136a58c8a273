//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Each variant is a distinct kind the HTTP layer branches on, so guard
/// violations must never collapse into a generic failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No authenticated identity where one is required.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but lacking the role or ownership for the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A referenced resource or moderation log does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The target is in a state that does not allow the transition
    /// (duplicate pending submission, stale version, wrong status).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A required field for the transition is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        assert_eq!(DomainError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(
            DomainError::conflict("already pending").to_string(),
            "conflict: already pending"
        );
        assert_eq!(
            DomainError::not_found("destination").to_string(),
            "not found: destination"
        );
    }
}
