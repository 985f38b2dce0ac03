//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree invariants.
/// Every operation that returns one has left the tree untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("cycle: cannot move {dragged} under its own descendant {target}")]
    Cycle { dragged: String, target: String },

    #[error("node is disabled: {0}")]
    DisabledNode(String),

    #[error("duplicate node id: {0}")]
    DuplicateId(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
