use thiserror::Error;

use crate::roles::KnownRole;

/// Failures building permission tables or reading policy configuration.
///
/// Authorization checks themselves never error; they fail closed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("role hierarchy contains a cycle through '{0}'")]
    HierarchyCycle(KnownRole),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidConfig { key: String, value: String },
}
