//! Read-side queries over organizations.
//!
//! Queries never mutate. Besides whole aggregates they answer the narrow
//! questions other contexts ask, such as who contracts an organization and
//! which member a person is inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use tenancy_org::{
    IdentityResolver, Invitation, MemberId, MemberType, OrgError, Organization, OrganizationId,
    OrganizationRepository, PersonId, ProfileDetails,
};

use crate::error::ServiceResult;

/// An invitation together with the invited person's profile.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationDetails {
    /// The invitation
    pub invitation: Invitation,

    /// Profile of the invited person
    pub invitee: ProfileDetails,
}

/// A member as listed to organization administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    /// Member ID
    pub member_id: MemberId,

    /// Person behind the membership
    pub person_id: PersonId,

    /// First and last name of the person
    pub full_name: String,

    /// Role classification
    pub member_type: MemberType,

    /// When the person joined
    pub joined_at: DateTime<Utc>,
}

/// Answers read-only questions about organizations.
pub struct OrganizationQueryService<R, I> {
    repository: Arc<R>,
    identity: Arc<I>,
}

impl<R, I> Clone for OrganizationQueryService<R, I> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<R, I> OrganizationQueryService<R, I>
where
    R: OrganizationRepository,
    I: IdentityResolver,
{
    /// Create a query service over the given collaborators.
    pub fn new(repository: Arc<R>, identity: Arc<I>) -> Self {
        Self {
            repository,
            identity,
        }
    }

    /// Load an organization, if it exists.
    #[instrument(skip(self))]
    pub async fn get_organization_by_id(
        &self,
        organization_id: OrganizationId,
    ) -> ServiceResult<Option<Organization>> {
        Ok(self.repository.find_by_id(organization_id).await?)
    }

    /// Every invitation of an organization, oldest first, with the
    /// invited person's profile.
    #[instrument(skip(self))]
    pub async fn list_invitations(
        &self,
        organization_id: OrganizationId,
    ) -> ServiceResult<Vec<InvitationDetails>> {
        let organization = self.require(organization_id).await?;

        let mut details = Vec::with_capacity(organization.invitations().len());
        for invitation in organization.invitations() {
            let invitee = self
                .identity
                .resolve_profile(invitation.invited_person_id())
                .await?;
            details.push(InvitationDetails {
                invitation: invitation.clone(),
                invitee,
            });
        }

        debug!(count = details.len(), "Invitations listed");
        Ok(details)
    }

    /// Members of an organization in joining order.
    #[instrument(skip(self))]
    pub async fn list_members(
        &self,
        organization_id: OrganizationId,
    ) -> ServiceResult<Vec<MemberView>> {
        let organization = self.require(organization_id).await?;

        let mut members = Vec::with_capacity(organization.members().len());
        for member in organization.members() {
            let profile = self.identity.resolve_profile(member.person_id()).await?;
            members.push(MemberView {
                member_id: member.id(),
                person_id: member.person_id(),
                full_name: profile.full_name(),
                member_type: member.member_type(),
                joined_at: member.joined_at(),
            });
        }

        Ok(members)
    }

    /// Organizations where the person is a member, in the order they were registered.
    ///
    /// A person without memberships gets an empty list.
    #[instrument(skip(self))]
    pub async fn list_organizations_for_person(
        &self,
        person_id: PersonId,
    ) -> ServiceResult<Vec<Organization>> {
        Ok(self
            .repository
            .find_all_by_member_person_id(person_id)
            .await?)
    }

    /// The person contracting an organization, which is its creator.
    #[instrument(skip(self))]
    pub async fn contractor_id(&self, organization_id: OrganizationId) -> ServiceResult<PersonId> {
        Ok(self.require(organization_id).await?.contractor_id())
    }

    /// The membership a person holds in an organization.
    ///
    /// # Errors
    ///
    /// `NotFound` if the organization is unknown or the person is not a
    /// member of it.
    #[instrument(skip(self))]
    pub async fn member_id_for_person(
        &self,
        organization_id: OrganizationId,
        person_id: PersonId,
    ) -> ServiceResult<MemberId> {
        let organization = self.require(organization_id).await?;
        organization
            .find_member_by_person(person_id)
            .map(|member| member.id())
            .ok_or_else(|| OrgError::not_found("Member", person_id).into())
    }

    async fn require(&self, organization_id: OrganizationId) -> ServiceResult<Organization> {
        self.repository
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| OrgError::not_found("Organization", organization_id).into())
    }
}
