//! Organization aggregate
//!
//! The organization is the unit of consistency for membership. It owns its
//! members and invitations, and every change to either goes through one of
//! its methods. The methods are pure in-memory mutations; loading and saving
//! the aggregate is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{MemberType, OrganizationStatus};
use crate::error::{OrgError, OrgResult};
use crate::ids::{InvitationId, MemberId, OrganizationId, PersonId};
use crate::invitation::{Invitation, InvitationStatus};
use crate::member::Member;
use crate::tax_id::TaxId;

/// An organization represents a business entity using the platform.
///
/// # Architecture
///
/// ```text
/// Organization
///   ├─ Members      (confirmed affiliations)
///   └─ Invitations  (PENDING / ACCEPTED / REJECTED history)
/// ```
///
/// Invariants held at all times:
/// - a person has at most one PENDING invitation
/// - a member never receives a new invitation
/// - a member exists exactly when its invitation was accepted
///
/// # Examples
///
/// ```
/// use tenancy_org::{MemberType, Organization, OrganizationStatus, PersonId};
///
/// let creator = PersonId::new();
/// let mut org = Organization::create(
///     "Acme",
///     None,
///     "20123456789",
///     creator,
///     OrganizationStatus::Active,
/// )
/// .unwrap();
///
/// let invitee = PersonId::new();
/// let invitation_id = org.add_invitation(invitee).unwrap().id();
/// org.accept_invitation(invitation_id, MemberType::Worker).unwrap();
/// assert!(org.is_member(invitee));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    legal_name: String,
    commercial_name: String,
    tax_id: TaxId,
    created_by: PersonId,
    status: OrganizationStatus,
    members: Vec<Member>,
    invitations: Vec<Invitation>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Organization {
    /// Creates a new organization with no members or invitations.
    ///
    /// Uniqueness of the tax id across organizations is not checked here;
    /// that needs the store.
    ///
    /// # Arguments
    ///
    /// * `legal_name` - Registered legal name, must not be blank
    /// * `commercial_name` - Trade name, empty when not given
    /// * `tax_id` - Eleven digits starting with `10` or `20`
    /// * `created_by` - The person creating the organization
    /// * `status` - Initial lifecycle status
    ///
    /// # Errors
    ///
    /// [`OrgError::Validation`] for a blank legal name or a malformed tax id.
    pub fn create(
        legal_name: impl Into<String>,
        commercial_name: Option<String>,
        tax_id: &str,
        created_by: PersonId,
        status: OrganizationStatus,
    ) -> OrgResult<Self> {
        let legal_name = legal_name.into();
        if legal_name.trim().is_empty() {
            return Err(OrgError::Validation(
                "legal name cannot be blank".to_string(),
            ));
        }
        let tax_id = TaxId::parse(tax_id)?;

        let now = Utc::now();
        Ok(Self {
            id: OrganizationId::new(),
            legal_name,
            commercial_name: commercial_name.unwrap_or_default(),
            tax_id,
            created_by,
            status,
            members: Vec::new(),
            invitations: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Unique identifier for the organization
    pub fn id(&self) -> OrganizationId {
        self.id
    }

    /// Registered legal name
    pub fn legal_name(&self) -> &str {
        &self.legal_name
    }

    /// Trade name, possibly empty
    pub fn commercial_name(&self) -> &str {
        &self.commercial_name
    }

    /// Tax identifier, fixed at creation
    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    /// The person who created the organization
    pub fn created_by(&self) -> PersonId {
        self.created_by
    }

    /// The contracting party of the organization, which is its creator.
    pub fn contractor_id(&self) -> PersonId {
        self.created_by
    }

    /// Lifecycle status
    pub fn status(&self) -> OrganizationStatus {
        self.status
    }

    /// Confirmed members, in joining order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// All invitations ever issued, in issue order
    pub fn invitations(&self) -> &[Invitation] {
        &self.invitations
    }

    /// When the organization was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the organization was last changed
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Optimistic concurrency token.
    ///
    /// `0` for an aggregate that was never saved. Stores bump it on every
    /// successful save and refuse updates whose version is stale.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record the version assigned by a store after a successful save.
    pub fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }

    /// Replace the commercial name. Nothing else changes.
    pub fn update_information(&mut self, commercial_name: impl Into<String>) -> &mut Self {
        self.commercial_name = commercial_name.into();
        self.touch();
        self
    }

    /// Issue a PENDING invitation to `person_id`.
    ///
    /// # Errors
    ///
    /// [`OrgError::Conflict`] if the person is already a member or already
    /// holds a pending invitation.
    pub fn add_invitation(&mut self, person_id: PersonId) -> OrgResult<&Invitation> {
        if self.is_member(person_id) {
            return Err(OrgError::Conflict(
                "this person is already a member of the organization".to_string(),
            ));
        }

        if self.pending_invitation_for(person_id).is_some() {
            return Err(OrgError::Conflict(
                "there is already a pending invitation for this person".to_string(),
            ));
        }

        self.invitations.push(Invitation::new(self.id, person_id));
        self.touch();
        Ok(&self.invitations[self.invitations.len() - 1])
    }

    /// Accept a pending invitation and enrol the invited person.
    ///
    /// The new member carries `member_type` and is appended to the members.
    ///
    /// # Errors
    ///
    /// - [`OrgError::NotFound`] if the invitation does not belong here
    /// - [`OrgError::InvalidStateTransition`] if it is no longer pending
    pub fn accept_invitation(
        &mut self,
        invitation_id: InvitationId,
        member_type: MemberType,
    ) -> OrgResult<&Invitation> {
        let index = self.invitation_index(invitation_id)?;
        self.invitations[index].transition(InvitationStatus::Accepted)?;

        let member = Member::from_invitation(&self.invitations[index], member_type);
        self.members.push(member);
        self.touch();
        Ok(&self.invitations[index])
    }

    /// Reject a pending invitation. No member is created.
    ///
    /// # Errors
    ///
    /// Same as [`Organization::accept_invitation`].
    pub fn reject_invitation(&mut self, invitation_id: InvitationId) -> OrgResult<&Invitation> {
        let index = self.invitation_index(invitation_id)?;
        self.invitations[index].transition(InvitationStatus::Rejected)?;
        self.touch();
        Ok(&self.invitations[index])
    }

    /// Remove a member by identity and return it.
    ///
    /// # Errors
    ///
    /// [`OrgError::NotFound`] if no such member exists.
    pub fn remove_member_by_id(&mut self, member_id: MemberId) -> OrgResult<Member> {
        let index = self
            .members
            .iter()
            .position(|member| member.id() == member_id)
            .ok_or_else(|| OrgError::not_found("Member", member_id))?;

        let removed = self.members.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Look up an invitation owned by this organization.
    pub fn find_invitation(&self, invitation_id: InvitationId) -> Option<&Invitation> {
        self.invitations.iter().find(|inv| inv.id() == invitation_id)
    }

    /// Look up a member owned by this organization.
    pub fn find_member(&self, member_id: MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id() == member_id)
    }

    /// The membership of `person_id`, if any.
    pub fn find_member_by_person(&self, person_id: PersonId) -> Option<&Member> {
        self.members
            .iter()
            .find(|member| member.person_id() == person_id)
    }

    /// Check whether a person is already a member of this organization.
    pub fn is_member(&self, person_id: PersonId) -> bool {
        self.find_member_by_person(person_id).is_some()
    }

    /// The pending invitation held by `person_id`, if any.
    pub fn pending_invitation_for(&self, person_id: PersonId) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|inv| inv.is_pending() && inv.invited_person_id() == person_id)
    }

    /// Invitations still awaiting a response.
    pub fn pending_invitations(&self) -> impl Iterator<Item = &Invitation> {
        self.invitations.iter().filter(|inv| inv.is_pending())
    }

    /// The most recently issued invitation.
    pub fn last_invitation(&self) -> Option<&Invitation> {
        self.invitations.last()
    }

    /// Lightweight representation for list displays.
    pub fn summary(&self) -> OrganizationSummary {
        OrganizationSummary {
            id: self.id,
            legal_name: self.legal_name.clone(),
            commercial_name: self.commercial_name.clone(),
            tax_id: self.tax_id.clone(),
            created_by: self.created_by,
            status: self.status,
            member_count: self.members.len(),
            pending_invitation_count: self.pending_invitations().count(),
        }
    }

    fn invitation_index(&self, invitation_id: InvitationId) -> OrgResult<usize> {
        self.invitations
            .iter()
            .position(|inv| inv.id() == invitation_id)
            .ok_or_else(|| OrgError::not_found("Invitation", invitation_id))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Summary of an organization for list displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: OrganizationId,

    /// Legal name
    pub legal_name: String,

    /// Commercial name
    pub commercial_name: String,

    /// Tax identifier
    pub tax_id: TaxId,

    /// Creator
    pub created_by: PersonId,

    /// Lifecycle status
    pub status: OrganizationStatus,

    /// Number of members
    pub member_count: usize,

    /// Number of invitations awaiting a response
    pub pending_invitation_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> Organization {
        Organization::create(
            "Acme",
            None,
            "20123456789",
            PersonId::new(),
            OrganizationStatus::Active,
        )
        .unwrap()
    }

    #[test]
    fn test_organization_creation() {
        let creator = PersonId::new();
        let org = Organization::create(
            "Acme",
            None,
            "20123456789",
            creator,
            OrganizationStatus::Active,
        )
        .unwrap();

        assert_eq!(org.legal_name(), "Acme");
        assert_eq!(org.commercial_name(), "");
        assert_eq!(org.tax_id().as_str(), "20123456789");
        assert_eq!(org.created_by(), creator);
        assert_eq!(org.status(), OrganizationStatus::Active);
        assert!(org.members().is_empty());
        assert!(org.invitations().is_empty());
        assert_eq!(org.version(), 0);
    }

    #[test]
    fn test_blank_legal_name_is_rejected() {
        for name in ["", "   ", "\t"] {
            let result = Organization::create(
                name,
                None,
                "20123456789",
                PersonId::new(),
                OrganizationStatus::Active,
            );
            assert!(matches!(result, Err(OrgError::Validation(_))));
        }
    }

    #[test]
    fn test_bad_tax_id_is_rejected() {
        let result = Organization::create(
            "Acme",
            Some("Acme Trading".to_string()),
            "30123456789",
            PersonId::new(),
            OrganizationStatus::Active,
        );
        assert!(matches!(result, Err(OrgError::Validation(_))));
    }

    #[test]
    fn test_update_information_only_touches_commercial_name() {
        let mut org = acme();
        let before = org.clone();

        org.update_information("Acme Trading");

        assert_eq!(org.commercial_name(), "Acme Trading");
        assert_eq!(org.legal_name(), before.legal_name());
        assert_eq!(org.tax_id(), before.tax_id());
        assert_eq!(org.created_by(), before.created_by());
        assert_eq!(org.status(), before.status());
    }

    #[test]
    fn test_accept_unknown_invitation_is_not_found() {
        let mut org = acme();
        let err = org
            .accept_invitation(InvitationId::new(), MemberType::Worker)
            .unwrap_err();
        assert!(matches!(err, OrgError::NotFound { entity: "Invitation", .. }));
    }

    #[test]
    fn test_summary_counts() {
        let mut org = acme();
        let first = org.add_invitation(PersonId::new()).unwrap().id();
        org.add_invitation(PersonId::new()).unwrap();
        org.accept_invitation(first, MemberType::Worker).unwrap();

        let summary = org.summary();
        assert_eq!(summary.member_count, 1);
        assert_eq!(summary.pending_invitation_count, 1);
    }

    #[test]
    fn test_last_invitation() {
        let mut org = acme();
        assert!(org.last_invitation().is_none());

        org.add_invitation(PersonId::new()).unwrap();
        let second = org.add_invitation(PersonId::new()).unwrap().id();
        assert_eq!(org.last_invitation().map(Invitation::id), Some(second));
    }

    #[test]
    fn test_serde_round_trip_keeps_children() {
        let mut org = acme();
        let id = org.add_invitation(PersonId::new()).unwrap().id();
        org.accept_invitation(id, MemberType::Worker).unwrap();

        let json = serde_json::to_string(&org).unwrap();
        let restored: Organization = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, org);
    }
}
