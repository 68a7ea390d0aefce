//! Command inputs and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenancy_org::{
    Invitation, InvitationId, InvitationStatus, Organization, OrganizationId, OrganizationStatus,
    PersonId, ProfileDetails,
};

/// Register a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// Registered legal name
    pub legal_name: String,

    /// Trade name
    #[serde(default)]
    pub commercial_name: Option<String>,

    /// Eleven-digit tax identifier
    pub tax_id: String,

    /// Person creating the organization
    pub created_by: PersonId,

    /// Initial status, active when not given
    #[serde(default)]
    pub status: OrganizationStatus,
}

impl CreateOrganization {
    /// An active organization with no trade name.
    pub fn new(
        legal_name: impl Into<String>,
        tax_id: impl Into<String>,
        created_by: PersonId,
    ) -> Self {
        Self {
            legal_name: legal_name.into(),
            commercial_name: None,
            tax_id: tax_id.into(),
            created_by,
            status: OrganizationStatus::default(),
        }
    }

    /// Set the trade name.
    pub fn with_commercial_name(mut self, commercial_name: impl Into<String>) -> Self {
        self.commercial_name = Some(commercial_name.into());
        self
    }
}

/// Replace the commercial name of an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrganization {
    /// Target organization
    pub organization_id: OrganizationId,

    /// New trade name
    pub commercial_name: String,
}

/// Invite the person registered with an e-mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitePersonByEmail {
    /// Inviting organization
    pub organization_id: OrganizationId,

    /// E-mail of the invitee
    pub email: String,
}

/// Result of the invitation commands: the saved organization, the affected
/// invitation and the profile of the person who invites on the
/// organization's behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationOutcome {
    /// Organization as stored by the command
    pub organization: Organization,

    /// The invitation issued or answered
    pub invitation: Invitation,

    /// Profile of the organization's creator
    pub inviter: ProfileDetails,
}

impl InvitationOutcome {
    /// Flatten into the shape shown to the invitee.
    pub fn view(&self) -> InvitationView {
        InvitationView {
            invitation_id: self.invitation.id(),
            organization_id: self.organization.id(),
            organization_name: self.organization.commercial_name().to_string(),
            inviter_name: self.inviter.full_name(),
            inviter_email: self.inviter.email.clone(),
            status: self.invitation.status(),
            invited_at: self.invitation.created_at(),
        }
    }
}

/// What an invitee sees of an invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationView {
    /// Invitation ID
    pub invitation_id: InvitationId,

    /// Inviting organization
    pub organization_id: OrganizationId,

    /// Commercial name of the inviting organization
    pub organization_name: String,

    /// Full name of the inviter
    pub inviter_name: String,

    /// Contact e-mail of the inviter
    pub inviter_email: String,

    /// Current status
    pub status: InvitationStatus,

    /// When the invitation was issued
    pub invited_at: DateTime<Utc>,
}
