//! Error types for membership operations
//!
//! These are the deterministic outcomes of running a command against the
//! current state of an organization. None of them is worth retrying.

use thiserror::Error;

use crate::invitation::InvitationStatus;

/// Domain error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgError {
    /// Malformed input caught at construction
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced organization, invitation, member or person does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up
        entity: &'static str,
        /// The identifier that failed to resolve
        id: String,
    },

    /// The command would break a uniqueness or membership invariant
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Accept or reject attempted on an invitation that already left PENDING
    #[error("Invitation cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Current status
        from: InvitationStatus,
        /// Requested status
        to: InvitationStatus,
    },
}

/// Result type for membership operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl OrgError {
    /// Shorthand for a [`OrgError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        OrgError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            OrgError::Validation(_) => 400,
            OrgError::NotFound { .. } => 404,
            OrgError::Conflict(_) | OrgError::InvalidStateTransition { .. } => 409,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::Validation(_) => "VALIDATION_ERROR",
            OrgError::NotFound { .. } => "NOT_FOUND",
            OrgError::Conflict(_) => "CONFLICT",
            OrgError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
        }
    }
}
