//! Identity resolution contract
//!
//! The organization context never owns person data. It asks the identity
//! context to translate an e-mail into a [`PersonId`] and a [`PersonId`]
//! into contact details.

use async_trait::async_trait;

use crate::error::OrgResult;
use crate::ids::PersonId;
use crate::profile::ProfileDetails;

/// Resolves person identities from the identity context.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Find the person registered with `email`.
    ///
    /// Fails with [`OrgError::NotFound`](crate::OrgError::NotFound) if no
    /// person uses that address.
    async fn resolve_person_id_by_email(&self, email: &str) -> OrgResult<PersonId>;

    /// Fetch the contact details of `person_id`.
    ///
    /// Fails with [`OrgError::NotFound`](crate::OrgError::NotFound) if the
    /// person is unknown.
    async fn resolve_profile(&self, person_id: PersonId) -> OrgResult<ProfileDetails>;
}
