//! # Tenancy Service
//!
//! Orchestration layer for organization membership.
//!
//! ## Overview
//!
//! The tenancy-service crate handles:
//! - **Commands**: Create, update and delete organizations; invite, accept, reject and remove
//! - **Queries**: Organizations, invitations with invitee profiles, member listings
//! - **Persistence**: An in-memory store with a unique tax id index and optimistic versioning
//! - **Identity**: An in-memory directory resolving e-mails and profiles
//! - **Retry**: Caller-side backoff for transient storage failures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tenancy_service::{
//!     CreateOrganization, InMemoryIdentityDirectory, InMemoryOrganizationRepository,
//!     InvitePersonByEmail, OrganizationCommandService,
//! };
//!
//! async fn example() -> tenancy_service::ServiceResult<()> {
//!     let identity = Arc::new(InMemoryIdentityDirectory::new());
//!     let owner = identity.register("Olga", "Owner", "owner@acme.test").await?;
//!     identity.register("Ana", "Bell", "ana@acme.test").await?;
//!
//!     let service = OrganizationCommandService::new(
//!         Arc::new(InMemoryOrganizationRepository::new()),
//!         identity,
//!     );
//!
//!     let org = service
//!         .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
//!         .await?;
//!
//!     let outcome = service
//!         .invite_person_by_email(InvitePersonByEmail {
//!             organization_id: org.id(),
//!             email: "ana@acme.test".to_string(),
//!         })
//!         .await?;
//!
//!     service.accept_invitation(outcome.invitation.id()).await?;
//!     Ok(())
//! }
//! ```

pub mod command_service;
pub mod commands;
pub mod config;
pub mod error;
pub mod identity;
pub mod query_service;
pub mod retry;
pub mod store;

// Re-export main types
pub use command_service::{OrganizationCommandService, DEFAULT_MEMBER_TYPE};
pub use commands::{
    CreateOrganization, InvitationOutcome, InvitationView, InvitePersonByEmail,
    UpdateOrganization,
};
pub use config::{ConfigError, ServiceConfig};
pub use error::{duplicate_tax_id, ServiceError, ServiceResult};
pub use identity::InMemoryIdentityDirectory;
pub use query_service::{InvitationDetails, MemberView, OrganizationQueryService};
pub use retry::{with_retry, RetryConfig};
pub use store::InMemoryOrganizationRepository;
