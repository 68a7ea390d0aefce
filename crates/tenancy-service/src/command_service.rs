//! Organization command service.
//!
//! Each command resolves the identities it needs, loads one aggregate,
//! invokes exactly one aggregate operation and saves the aggregate back.
//! The store's version check makes the load-mutate-save cycle single-writer:
//! a concurrent change between load and save fails the command with a
//! conflict and nothing is written.
//!
//! Events are published only after a successful save. A publication failure
//! is logged and does not undo the command.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use tenancy_events::{EventBus, MemoryEventBus, MembershipEvent};
use tenancy_org::{
    IdentityResolver, InvitationId, MemberId, MemberType, OrgError, Organization,
    OrganizationId, OrganizationRepository, ProfileDetails, TaxId,
};

use crate::commands::{
    CreateOrganization, InvitationOutcome, InvitePersonByEmail, UpdateOrganization,
};
use crate::config::ServiceConfig;
use crate::error::{duplicate_tax_id, ServiceResult};

/// Member type given to people who accept an invitation.
pub const DEFAULT_MEMBER_TYPE: MemberType = MemberType::Worker;

/// Executes membership commands against an [`OrganizationRepository`].
pub struct OrganizationCommandService<R, I> {
    repository: Arc<R>,
    identity: Arc<I>,
    events: Option<Arc<dyn EventBus>>,
}

impl<R, I> Clone for OrganizationCommandService<R, I> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            identity: self.identity.clone(),
            events: self.events.clone(),
        }
    }
}

impl<R, I> std::fmt::Debug for OrganizationCommandService<R, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationCommandService")
            .field("publishes_events", &self.events.is_some())
            .finish()
    }
}

impl<R, I> OrganizationCommandService<R, I>
where
    R: OrganizationRepository,
    I: IdentityResolver,
{
    /// Create a service that publishes no events.
    pub fn new(repository: Arc<R>, identity: Arc<I>) -> Self {
        Self {
            repository,
            identity,
            events: None,
        }
    }

    /// Publish committed changes on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Create a service from configuration.
    ///
    /// When `publish_events` is set the service gets its own
    /// [`MemoryEventBus`], reachable through [`Self::event_bus`].
    pub fn from_config(repository: Arc<R>, identity: Arc<I>, config: &ServiceConfig) -> Self {
        let service = Self::new(repository, identity);
        if config.publish_events {
            service.with_event_bus(Arc::new(MemoryEventBus::with_capacity(
                config.event_channel_capacity,
            )))
        } else {
            service
        }
    }

    /// The bus committed changes are published on.
    pub fn event_bus(&self) -> Option<Arc<dyn EventBus>> {
        self.events.clone()
    }

    /// Register a new organization.
    ///
    /// # Errors
    ///
    /// - `Validation` for a blank legal name or a malformed tax id
    /// - `Conflict` if the tax id is already registered, whether the
    ///   pre-check or the store's unique index catches it
    #[instrument(skip(self, command), fields(tax_id = %command.tax_id))]
    pub async fn create_organization(
        &self,
        command: CreateOrganization,
    ) -> ServiceResult<Organization> {
        let organization = Organization::create(
            command.legal_name,
            command.commercial_name,
            &command.tax_id,
            command.created_by,
            command.status,
        )?;

        // Best effort; the unique index decides
        if self.repository.exists_by_tax_id(organization.tax_id()).await? {
            warn!("Tax id already registered");
            return Err(duplicate_tax_id(organization.tax_id()).into());
        }

        let saved = self.repository.save(&organization).await?;
        info!(organization_id = %saved.id(), "Organization created");

        self.publish(MembershipEvent::OrganizationCreated {
            organization_id: saved.id(),
            tax_id: saved.tax_id().clone(),
            created_by: saved.created_by(),
        })
        .await;

        Ok(saved)
    }

    /// Replace the commercial name of an organization.
    #[instrument(skip(self, command), fields(organization_id = %command.organization_id))]
    pub async fn update_organization(
        &self,
        command: UpdateOrganization,
    ) -> ServiceResult<Organization> {
        let mut organization = self.load(command.organization_id).await?;
        organization.update_information(command.commercial_name);

        let saved = self.repository.save(&organization).await?;
        info!(organization_id = %saved.id(), "Organization updated");

        self.publish(MembershipEvent::OrganizationUpdated {
            organization_id: saved.id(),
            commercial_name: saved.commercial_name().to_string(),
        })
        .await;

        Ok(saved)
    }

    /// Delete an organization with all of its members and invitations.
    #[instrument(skip(self))]
    pub async fn delete_organization_by_tax_id(&self, tax_id: &str) -> ServiceResult<()> {
        let tax_id = TaxId::parse(tax_id)?;
        let organization = self
            .repository
            .find_by_tax_id(&tax_id)
            .await?
            .ok_or_else(|| OrgError::not_found("Organization", &tax_id))?;

        self.repository.delete(&organization).await?;
        info!(organization_id = %organization.id(), "Organization deleted");

        self.publish(MembershipEvent::OrganizationDeleted {
            organization_id: organization.id(),
            tax_id,
        })
        .await;

        Ok(())
    }

    /// Invite the person registered with an e-mail.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the e-mail or the organization is unknown
    /// - `Conflict` if the person is already a member or already invited
    #[instrument(skip(self, command), fields(organization_id = %command.organization_id))]
    pub async fn invite_person_by_email(
        &self,
        command: InvitePersonByEmail,
    ) -> ServiceResult<InvitationOutcome> {
        let person_id = self
            .identity
            .resolve_person_id_by_email(&command.email)
            .await?;
        let mut organization = self.load(command.organization_id).await?;
        let inviter = self.inviter(&organization).await?;

        let invitation = match organization.add_invitation(person_id) {
            Ok(invitation) => invitation.clone(),
            Err(e) => {
                warn!(person_id = %person_id, error = %e, "Invitation refused");
                return Err(e.into());
            }
        };

        let saved = self.repository.save(&organization).await?;
        info!(
            organization_id = %saved.id(),
            invitation_id = %invitation.id(),
            person_id = %person_id,
            "Invitation sent"
        );

        self.publish(MembershipEvent::InvitationSent {
            organization_id: saved.id(),
            invitation_id: invitation.id(),
            person_id,
        })
        .await;

        Ok(InvitationOutcome {
            organization: saved,
            invitation,
            inviter,
        })
    }

    /// Accept a pending invitation; the invitee joins as a worker.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no organization owns the invitation
    /// - `InvalidStateTransition` if the invitation was already answered
    #[instrument(skip(self))]
    pub async fn accept_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> ServiceResult<InvitationOutcome> {
        let mut organization = self.load_owning_invitation(invitation_id).await?;
        let inviter = self.inviter(&organization).await?;

        let invitation = organization
            .accept_invitation(invitation_id, DEFAULT_MEMBER_TYPE)?
            .clone();

        let saved = self.repository.save(&organization).await?;
        let person_id = invitation.invited_person_id();

        if let Some(member) = saved.find_member_by_person(person_id) {
            info!(
                organization_id = %saved.id(),
                invitation_id = %invitation_id,
                member_id = %member.id(),
                "Invitation accepted"
            );

            self.publish(MembershipEvent::InvitationAccepted {
                organization_id: saved.id(),
                invitation_id,
                person_id,
                member_id: member.id(),
                member_type: member.member_type(),
            })
            .await;
        }

        Ok(InvitationOutcome {
            organization: saved,
            invitation,
            inviter,
        })
    }

    /// Decline a pending invitation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::accept_invitation`].
    #[instrument(skip(self))]
    pub async fn reject_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> ServiceResult<InvitationOutcome> {
        let mut organization = self.load_owning_invitation(invitation_id).await?;
        let inviter = self.inviter(&organization).await?;

        let invitation = organization.reject_invitation(invitation_id)?.clone();

        let saved = self.repository.save(&organization).await?;
        info!(
            organization_id = %saved.id(),
            invitation_id = %invitation_id,
            "Invitation rejected"
        );

        self.publish(MembershipEvent::InvitationRejected {
            organization_id: saved.id(),
            invitation_id,
            person_id: invitation.invited_person_id(),
        })
        .await;

        Ok(InvitationOutcome {
            organization: saved,
            invitation,
            inviter,
        })
    }

    /// Remove a member from the organization that owns it.
    #[instrument(skip(self))]
    pub async fn remove_member(&self, member_id: MemberId) -> ServiceResult<()> {
        let mut organization = self
            .repository
            .find_organization_owning_member(member_id)
            .await?
            .ok_or_else(|| OrgError::not_found("Member", member_id))?;

        let removed = organization.remove_member_by_id(member_id)?;

        let saved = self.repository.save(&organization).await?;
        info!(
            organization_id = %saved.id(),
            member_id = %member_id,
            "Member removed"
        );

        self.publish(MembershipEvent::MemberRemoved {
            organization_id: saved.id(),
            member_id,
            person_id: removed.person_id(),
        })
        .await;

        Ok(())
    }

    async fn load(&self, organization_id: OrganizationId) -> ServiceResult<Organization> {
        debug!(organization_id = %organization_id, "Loading organization");
        self.repository
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| OrgError::not_found("Organization", organization_id).into())
    }

    async fn load_owning_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> ServiceResult<Organization> {
        self.repository
            .find_organization_owning_invitation(invitation_id)
            .await?
            .ok_or_else(|| OrgError::not_found("Invitation", invitation_id).into())
    }

    /// Invitations go out on behalf of the organization's creator.
    async fn inviter(&self, organization: &Organization) -> ServiceResult<ProfileDetails> {
        Ok(self
            .identity
            .resolve_profile(organization.contractor_id())
            .await?)
    }

    async fn publish(&self, event: MembershipEvent) {
        let Some(bus) = &self.events else {
            return;
        };

        let result = match event.to_event() {
            Ok(envelope) => bus.publish(envelope).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            warn!(
                event_type = event.event_type(),
                error = %e,
                "Failed to publish membership event"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::InMemoryIdentityDirectory;
    use crate::store::InMemoryOrganizationRepository;
    use crate::ServiceError;
    use tenancy_org::{InvitationStatus, PersonId};

    async fn setup() -> (
        OrganizationCommandService<InMemoryOrganizationRepository, InMemoryIdentityDirectory>,
        Arc<InMemoryIdentityDirectory>,
        PersonId,
    ) {
        let identity = Arc::new(InMemoryIdentityDirectory::new());
        let owner = identity
            .register("Olga", "Owner", "owner@acme.test")
            .await
            .unwrap();
        let service = OrganizationCommandService::new(
            Arc::new(InMemoryOrganizationRepository::new()),
            identity.clone(),
        );
        (service, identity, owner)
    }

    #[tokio::test]
    async fn test_create_then_duplicate_is_conflict() {
        let (service, _, owner) = setup().await;

        let org = service
            .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
            .await
            .unwrap();
        assert_eq!(org.version(), 1);

        let err = service
            .create_organization(CreateOrganization::new("Other", "20123456789", owner))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(duplicate_tax_id(org.tax_id())));
    }

    #[tokio::test]
    async fn test_invitation_carries_inviter_profile() {
        let (service, identity, owner) = setup().await;
        identity.register("Ana", "Bell", "a@b.com").await.unwrap();

        let org = service
            .create_organization(
                CreateOrganization::new("Acme", "20123456789", owner)
                    .with_commercial_name("Acme Trading"),
            )
            .await
            .unwrap();

        let outcome = service
            .invite_person_by_email(InvitePersonByEmail {
                organization_id: org.id(),
                email: "a@b.com".to_string(),
            })
            .await
            .unwrap();

        let view = outcome.view();
        assert_eq!(view.status, InvitationStatus::Pending);
        assert_eq!(view.organization_name, "Acme Trading");
        assert_eq!(view.inviter_name, "Olga Owner");
        assert_eq!(view.inviter_email, "owner@acme.test");
        assert_eq!(outcome.organization.version(), 2);
    }

    #[tokio::test]
    async fn test_unknown_organization_is_not_found() {
        let (service, _, _) = setup().await;

        let err = service
            .update_organization(UpdateOrganization {
                organization_id: OrganizationId::new(),
                commercial_name: "Nobody".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = service
            .accept_invitation(InvitationId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(OrgError::NotFound { entity: "Invitation", .. })
        ));
    }

    #[tokio::test]
    async fn test_from_config_controls_event_bus() {
        let repository = Arc::new(InMemoryOrganizationRepository::new());
        let identity = Arc::new(InMemoryIdentityDirectory::new());

        let service = OrganizationCommandService::from_config(
            repository.clone(),
            identity.clone(),
            &ServiceConfig::default(),
        );
        assert!(service.event_bus().is_some());

        let config = ServiceConfig {
            publish_events: false,
            ..ServiceConfig::default()
        };
        let service = OrganizationCommandService::from_config(repository, identity, &config);
        assert!(service.event_bus().is_none());
    }
}
