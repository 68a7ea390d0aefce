//! In-memory organization store.
//!
//! Holds whole aggregates behind a single lock. The tax id index is the
//! authoritative uniqueness guard, and the child indexes answer the
//! reverse lookups without the children pointing back at their root.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use tenancy_org::{
    InvitationId, MemberId, Organization, OrganizationId, OrganizationRepository, PersonId,
    RepositoryError, RepositoryResult, TaxId,
};

/// [`OrganizationRepository`] kept in process memory.
///
/// Lists of organizations come back in the order they were first saved.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationRepository {
    state: RwLock<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    organizations: HashMap<OrganizationId, Organization>,
    by_tax_id: HashMap<TaxId, OrganizationId>,
    invitation_owners: HashMap<InvitationId, OrganizationId>,
    member_owners: HashMap<MemberId, OrganizationId>,
    /// Order of first save, kept across updates
    registrations: HashMap<OrganizationId, u64>,
    next_registration: u64,
}

impl StoreState {
    /// Drop the stored aggregate and every index entry pointing at it.
    fn detach(&mut self, id: OrganizationId) -> Option<Organization> {
        let stored = self.organizations.remove(&id)?;
        self.by_tax_id.remove(stored.tax_id());
        for invitation in stored.invitations() {
            self.invitation_owners.remove(&invitation.id());
        }
        for member in stored.members() {
            self.member_owners.remove(&member.id());
        }
        Some(stored)
    }

    fn attach(&mut self, organization: Organization) {
        let id = organization.id();
        self.by_tax_id.insert(organization.tax_id().clone(), id);
        for invitation in organization.invitations() {
            self.invitation_owners.insert(invitation.id(), id);
        }
        for member in organization.members() {
            self.member_owners.insert(member.id(), id);
        }
        self.organizations.insert(id, organization);
    }

    fn owned_by(&self, owner: Option<&OrganizationId>) -> Option<Organization> {
        owner.and_then(|id| self.organizations.get(id)).cloned()
    }
}

impl InMemoryOrganizationRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored organizations.
    pub async fn len(&self) -> usize {
        self.state.read().await.organizations.len()
    }

    /// Whether the store holds no organizations.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.organizations.is_empty()
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn save(&self, organization: &Organization) -> RepositoryResult<Organization> {
        let id = organization.id();
        let mut state = self.state.write().await;

        let next_version = match state.organizations.get(&id) {
            Some(stored) if stored.version() != organization.version() => {
                return Err(RepositoryError::VersionConflict {
                    expected: organization.version(),
                    found: stored.version(),
                });
            }
            Some(stored) => stored.version() + 1,
            // A versioned aggregate that is gone was deleted under us
            None if organization.version() != 0 => return Err(RepositoryError::NotFound(id)),
            None => 1,
        };

        if let Some(owner) = state.by_tax_id.get(organization.tax_id()) {
            if *owner != id {
                return Err(RepositoryError::DuplicateTaxId(organization.tax_id().clone()));
            }
        }

        if !state.registrations.contains_key(&id) {
            let registration = state.next_registration;
            state.next_registration += 1;
            state.registrations.insert(id, registration);
        }

        let mut stored = organization.clone();
        stored.mark_persisted(next_version);

        state.detach(id);
        state.attach(stored.clone());

        tracing::debug!(
            organization_id = %id,
            version = next_version,
            "Organization saved"
        );
        Ok(stored)
    }

    async fn find_by_id(&self, id: OrganizationId) -> RepositoryResult<Option<Organization>> {
        Ok(self.state.read().await.organizations.get(&id).cloned())
    }

    async fn find_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.owned_by(state.by_tax_id.get(tax_id)))
    }

    async fn exists_by_tax_id(&self, tax_id: &TaxId) -> RepositoryResult<bool> {
        Ok(self.state.read().await.by_tax_id.contains_key(tax_id))
    }

    async fn find_organization_owning_invitation(
        &self,
        invitation_id: InvitationId,
    ) -> RepositoryResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.owned_by(state.invitation_owners.get(&invitation_id)))
    }

    async fn find_organization_owning_member(
        &self,
        member_id: MemberId,
    ) -> RepositoryResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.owned_by(state.member_owners.get(&member_id)))
    }

    async fn find_all_by_member_person_id(
        &self,
        person_id: PersonId,
    ) -> RepositoryResult<Vec<Organization>> {
        let state = self.state.read().await;
        let mut organizations: Vec<Organization> = state
            .organizations
            .values()
            .filter(|org| org.is_member(person_id))
            .cloned()
            .collect();
        organizations.sort_by_key(|org| state.registrations.get(&org.id()).copied());
        Ok(organizations)
    }

    async fn delete(&self, organization: &Organization) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        match state.detach(organization.id()) {
            Some(_) => {
                state.registrations.remove(&organization.id());
                tracing::debug!(organization_id = %organization.id(), "Organization deleted");
                Ok(())
            }
            None => Err(RepositoryError::NotFound(organization.id())),
        }
    }
}
