//! Error types for the orchestration layer
//!
//! Domain errors pass through unchanged. Storage failures are translated:
//! a unique-constraint or version violation becomes the same conflict the
//! domain would have reported, anything else is a transient storage error.

use tenancy_org::{OrgError, RepositoryError, TaxId};
use thiserror::Error;

/// Service error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Deterministic outcome of the command against current state
    #[error(transparent)]
    Domain(#[from] OrgError),

    /// Transient persistence failure; nothing was written
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// The conflict reported for a tax id that is already registered, whether
/// the pre-check or the store's unique constraint caught it.
pub fn duplicate_tax_id(tax_id: &TaxId) -> OrgError {
    OrgError::Conflict(format!(
        "an organization with tax id {tax_id} already exists"
    ))
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateTaxId(tax_id) => duplicate_tax_id(&tax_id).into(),
            RepositoryError::VersionConflict { .. } => OrgError::Conflict(
                "the organization was modified concurrently, reload and retry".to_string(),
            )
            .into(),
            RepositoryError::NotFound(id) => OrgError::not_found("Organization", id).into(),
            RepositoryError::Unavailable(reason) => ServiceError::Storage(reason),
        }
    }
}

impl ServiceError {
    /// Only transient storage failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Storage(_))
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServiceError::Storage(_))
    }

    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&OrgError> {
        match self {
            ServiceError::Domain(err) => Some(err),
            ServiceError::Storage(_) => None,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Domain(err) => err.status_code(),
            ServiceError::Storage(_) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Domain(err) => err.error_code(),
            ServiceError::Storage(_) => "STORAGE_UNAVAILABLE",
        }
    }
}
