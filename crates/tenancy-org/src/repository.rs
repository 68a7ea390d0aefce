//! Persistence contract for the organization aggregate
//!
//! Organizations are the only externally addressable entities. Members and
//! invitations are stored and loaded with their owning organization, and the
//! store answers the reverse question (which organization owns this child)
//! itself instead of the child carrying a pointer for it.

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::{InvitationId, MemberId, OrganizationId, PersonId};
use crate::organization::Organization;
use crate::tax_id::TaxId;

/// Storage-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The unique tax id constraint rejected the write
    #[error("Duplicate tax id: {0}")]
    DuplicateTaxId(TaxId),

    /// The stored aggregate changed since it was loaded
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict {
        /// Version the writer loaded
        expected: u64,
        /// Version currently stored
        found: u64,
    },

    /// The aggregate to update or delete is not stored
    #[error("Organization not stored: {0}")]
    NotFound(OrganizationId),

    /// Transient backend failure; the write did not happen
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Whole-aggregate persistence for [`Organization`].
///
/// Implementations must treat `save` as one atomic write of the root and all
/// of its children, enforce tax id uniqueness, and reject a save whose
/// [`Organization::version`] differs from the stored one.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Insert or update the aggregate and return it with its new version.
    async fn save(&self, organization: &Organization) -> RepositoryResult<Organization>;

    /// Load an aggregate by its identity.
    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>>;

    /// Load an aggregate by tax identifier.
    async fn find_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<Option<Organization>>;

    /// Whether an organization with this tax identifier is stored.
    async fn exists_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<bool>;

    /// Load the aggregate that owns an invitation.
    async fn find_organization_owning_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> RepositoryResult<Option<Organization>>;

    /// Load the aggregate that owns a member.
    async fn find_organization_owning_member(
        &self,
        member_id: MemberId,
    ) -> RepositoryResult<Option<Organization>>;

    /// Every organization where `person_id` is a member.
    async fn find_all_by_member_person_id(
        &self,
        person_id: PersonId,
    ) -> RepositoryResult<Vec<Organization>>;

    /// Delete the aggregate together with its children.
    async fn delete(&self, organization: &Organization) -> RepositoryResult<()>;
}
