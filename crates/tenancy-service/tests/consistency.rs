//! Concurrency control, storage failures and event publication.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tenancy_events::{
    Event, EventBus, EventBusError, EventBusResult, EventBusStats, EventHandler, MembershipEvent,
    MemoryEventBus, Subscription,
};
use tenancy_org::{
    InvitationId, MemberId, OrgError, Organization, OrganizationId, OrganizationRepository,
    PersonId, RepositoryError, RepositoryResult, TaxId,
};
use tenancy_service::{
    duplicate_tax_id, with_retry, CreateOrganization, InMemoryIdentityDirectory,
    InMemoryOrganizationRepository, InvitePersonByEmail, OrganizationCommandService, RetryConfig,
    ServiceError,
};

/// Store wrapper with a blind pre-check and an optional run of failing saves.
#[derive(Default)]
struct FaultyRepository {
    inner: InMemoryOrganizationRepository,
    hide_existing_tax_ids: bool,
    failing_saves: AtomicU32,
    save_attempts: AtomicU32,
}

impl FaultyRepository {
    fn blind() -> Self {
        Self {
            hide_existing_tax_ids: true,
            ..Self::default()
        }
    }

    fn failing(saves: u32) -> Self {
        Self {
            failing_saves: AtomicU32::new(saves),
            ..Self::default()
        }
    }
}

#[async_trait]
impl OrganizationRepository for FaultyRepository {
    async fn save(&self, organization: &Organization) -> RepositoryResult<Organization> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_saves.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_saves.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("connection reset".to_string()));
        }
        self.inner.save(organization).await
    }

    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<Option<Organization>> {
        self.inner.find_by_tax_id(tax_id).await
    }

    async fn exists_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<bool> {
        if self.hide_existing_tax_ids {
            return Ok(false);
        }
        self.inner.exists_by_tax_id(tax_id).await
    }

    async fn find_organization_owning_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> RepositoryResult<Option<Organization>> {
        self.inner
            .find_organization_owning_invitation(invitation_id)
            .await
    }

    async fn find_organization_owning_member(
        &self,
        member_id: MemberId,
    ) -> RepositoryResult<Option<Organization>> {
        self.inner.find_organization_owning_member(member_id).await
    }

    async fn find_all_by_member_person_id(
        &self,
        person_id: PersonId,
    ) -> RepositoryResult<Vec<Organization>> {
        self.inner.find_all_by_member_person_id(person_id).await
    }

    async fn delete(&self, organization: &Organization) -> RepositoryResult<()> {
        self.inner.delete(organization).await
    }
}

/// Bus whose publications always fail.
struct BrokenBus;

#[async_trait]
impl EventBus for BrokenBus {
    async fn publish(&self, _event: Event) -> EventBusResult<()> {
        Err(EventBusError::PublishError("broker down".to_string()))
    }

    async fn subscribe(&self, _topic: &str) -> EventBusResult<Subscription> {
        Err(EventBusError::ChannelClosed)
    }

    async fn register_handler(&self, _handler: Arc<dyn EventHandler>) -> EventBusResult<()> {
        Ok(())
    }

    async fn unsubscribe(&self, _subscription_id: &str) -> EventBusResult<()> {
        Ok(())
    }

    async fn stats(&self) -> EventBusStats {
        EventBusStats::default()
    }
}

async fn directory() -> (Arc<InMemoryIdentityDirectory>, PersonId) {
    let identity = Arc::new(InMemoryIdentityDirectory::new());
    let owner = identity
        .register("Olga", "Owner", "owner@acme.test")
        .await
        .unwrap();
    (identity, owner)
}

#[tokio::test]
async fn test_storage_duplicate_surfaces_as_pre_check_conflict() {
    let (identity, owner) = directory().await;
    let service = OrganizationCommandService::new(Arc::new(FaultyRepository::blind()), identity);

    service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap();

    let err = service
        .create_organization(CreateOrganization::new("Copycat", "20123456789", owner))
        .await
        .unwrap_err();

    let tax_id = TaxId::parse("20123456789").unwrap();
    assert_eq!(err, ServiceError::Domain(duplicate_tax_id(&tax_id)));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_stale_aggregate_save_is_conflict() {
    let repository = Arc::new(InMemoryOrganizationRepository::new());
    let (identity, owner) = directory().await;
    let service = OrganizationCommandService::new(repository.clone(), identity);

    let org = service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap();

    // Another writer commits between our load and save
    let mut stale = repository.find_by_id(org.id()).await.unwrap().unwrap();
    service
        .update_organization(tenancy_service::UpdateOrganization {
            organization_id: org.id(),
            commercial_name: "First".to_string(),
        })
        .await
        .unwrap();

    stale.update_information("Second");
    let err: ServiceError = repository.save(&stale).await.unwrap_err().into();
    assert!(matches!(err, ServiceError::Domain(OrgError::Conflict(_))));

    let stored = repository.find_by_id(org.id()).await.unwrap().unwrap();
    assert_eq!(stored.commercial_name(), "First");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invites_for_same_person_admit_one() {
    for _ in 0..20 {
        let (identity, owner) = directory().await;
        identity.register("Ana", "Bell", "a@b.com").await.unwrap();
        let repository = Arc::new(InMemoryOrganizationRepository::new());
        let service = OrganizationCommandService::new(repository.clone(), identity);

        let org = service
            .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let service = service.clone();
                let command = InvitePersonByEmail {
                    organization_id: org.id(),
                    email: "a@b.com".to_string(),
                };
                tokio::spawn(async move { service.invite_person_by_email(command).await })
            })
            .collect();

        let mut successes = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => successes += 1,
                Err(ServiceError::Domain(OrgError::Conflict(_))) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!((successes, conflicts), (1, 1));

        let stored = repository.find_by_id(org.id()).await.unwrap().unwrap();
        assert_eq!(stored.pending_invitations().count(), 1);
    }
}

#[tokio::test]
async fn test_transient_failures_are_retried_by_caller() {
    let repository = Arc::new(FaultyRepository::failing(2));
    let (identity, owner) = directory().await;
    let service = OrganizationCommandService::new(repository.clone(), identity);

    // Without retry the caller sees the transient error
    let err = service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.status_code(), 503);

    let command = CreateOrganization::new("Acme", "20123456789", owner);
    let service = &service;
    let org = with_retry(&RetryConfig::fast(), move || {
        service.create_organization(command.clone())
    })
    .await
    .unwrap();

    assert_eq!(org.version(), 1);
    assert_eq!(repository.save_attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_conflicts_are_not_retried() {
    let repository = Arc::new(FaultyRepository::default());
    let (identity, owner) = directory().await;
    let service = OrganizationCommandService::new(repository.clone(), identity);

    service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap();

    let command = CreateOrganization::new("Acme", "20123456789", owner);
    let service = &service;
    let result = with_retry(&RetryConfig::fast(), move || {
        service.create_organization(command.clone())
    })
    .await;

    assert!(matches!(
        result,
        Err(ServiceError::Domain(OrgError::Conflict(_)))
    ));
    assert_eq!(repository.save_attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_committed_commands_publish_events() {
    let (identity, owner) = directory().await;
    let ana = identity.register("Ana", "Bell", "a@b.com").await.unwrap();
    let bus = Arc::new(MemoryEventBus::new());
    let service = OrganizationCommandService::new(
        Arc::new(InMemoryOrganizationRepository::new()),
        identity,
    )
    .with_event_bus(bus.clone());

    let mut all = bus.subscribe("#").await.unwrap();
    let mut invitations = bus.subscribe("invitation.*").await.unwrap();

    let org = service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap();
    let sent = service
        .invite_person_by_email(InvitePersonByEmail {
            organization_id: org.id(),
            email: "a@b.com".to_string(),
        })
        .await
        .unwrap();
    let accepted = service.accept_invitation(sent.invitation.id()).await.unwrap();
    let member_id = accepted.organization.members()[0].id();
    service.remove_member(member_id).await.unwrap();

    // A failed command publishes nothing
    service
        .accept_invitation(sent.invitation.id())
        .await
        .unwrap_err();

    let mut topics = Vec::new();
    for _ in 0..4 {
        let event = tokio::time::timeout(Duration::from_millis(100), all.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.organization_id, Some(org.id()));
        topics.push(event.event_type);
    }
    assert_eq!(
        topics,
        vec![
            "organization.created",
            "invitation.sent",
            "invitation.accepted",
            "member.removed"
        ]
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(50), all.recv())
            .await
            .is_err()
    );

    let _sent = invitations.recv().await.unwrap();
    let accepted_event = invitations.recv().await.unwrap();
    let payload: MembershipEvent = accepted_event.parse_payload().unwrap();
    assert_eq!(
        payload,
        MembershipEvent::InvitationAccepted {
            organization_id: org.id(),
            invitation_id: sent.invitation.id(),
            person_id: ana,
            member_id,
            member_type: tenancy_org::MemberType::Worker,
        }
    );
}

#[tokio::test]
async fn test_publish_failure_keeps_commit() {
    let repository = Arc::new(InMemoryOrganizationRepository::new());
    let (identity, owner) = directory().await;
    let service = OrganizationCommandService::new(repository.clone(), identity)
        .with_event_bus(Arc::new(BrokenBus));

    let org = service
        .create_organization(CreateOrganization::new("Acme", "20123456789", owner))
        .await
        .unwrap();

    assert!(repository.find_by_id(org.id()).await.unwrap().is_some());
}
