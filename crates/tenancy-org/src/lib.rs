//! # Tenancy Organizations
//!
//! This crate is the domain core of organization membership for the
//! multi-tenant project management backend.
//!
//! ## Overview
//!
//! The tenancy-org crate handles:
//! - **Organizations**: The aggregate root and sole entry point for membership changes
//! - **Invitations**: Proposed affiliations with a PENDING → ACCEPTED/REJECTED lifecycle
//! - **Members**: Confirmed affiliations, created only by accepting an invitation
//! - **Catalogs**: Organization statuses and member types
//! - **Contracts**: What the orchestration layer must supply (storage, identity)
//!
//! ## Architecture
//!
//! ```text
//! Orchestration layer
//!   ├─ IdentityResolver ─→ PersonId / ProfileDetails
//!   └─ OrganizationRepository ─→ Organization
//!                                  ├─ Members
//!                                  └─ Invitations
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use tenancy_org::{InvitationStatus, MemberType, Organization, OrganizationStatus, PersonId};
//!
//! let creator = PersonId::new();
//! let mut org = Organization::create("Acme", None, "20123456789", creator, OrganizationStatus::Active)?;
//!
//! let invitee = PersonId::new();
//! let invitation_id = org.add_invitation(invitee)?.id();
//!
//! let invitation = org.accept_invitation(invitation_id, MemberType::Worker)?;
//! assert_eq!(invitation.status(), InvitationStatus::Accepted);
//! assert_eq!(org.members().len(), 1);
//! # Ok::<(), tenancy_org::OrgError>(())
//! ```

pub mod catalog;
pub mod error;
pub mod identity;
pub mod ids;
pub mod invitation;
pub mod member;
pub mod organization;
pub mod profile;
pub mod repository;
pub mod tax_id;

// Re-export main types for convenience
pub use catalog::{MemberType, OrganizationStatus};
pub use error::{OrgError, OrgResult};
pub use identity::IdentityResolver;
pub use ids::{InvitationId, MemberId, OrganizationId, PersonId};
pub use invitation::{Invitation, InvitationStatus};
pub use member::Member;
pub use organization::{Organization, OrganizationSummary};
pub use profile::ProfileDetails;
pub use repository::{OrganizationRepository, RepositoryError, RepositoryResult};
pub use tax_id::TaxId;
