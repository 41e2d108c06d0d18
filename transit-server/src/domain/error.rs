//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from API/IO errors.

/// Domain-level errors for identifier and code validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Identifier was empty or whitespace only
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(&'static str),

    /// Direction code outside 0/1
    #[error("invalid direction code {0}: must be 0 or 1")]
    InvalidDirection(i64),

    /// Unknown travel mode name
    #[error("unknown travel mode: {0}")]
    UnknownMode(String),
}
