//! Member domain model
//!
//! A member is the confirmed affiliation between a person and an
//! organization. Members only come into existence when an invitation is
//! accepted, and leave only through an explicit removal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::MemberType;
use crate::ids::{InvitationId, MemberId, OrganizationId, PersonId};
use crate::invitation::Invitation;

/// Organization member linking a person to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    id: MemberId,
    organization_id: OrganizationId,
    person_id: PersonId,
    member_type: MemberType,
    joined_at: DateTime<Utc>,
    invitation_id: InvitationId,
}

impl Member {
    /// Build the member produced by accepting `invitation`.
    pub(crate) fn from_invitation(invitation: &Invitation, member_type: MemberType) -> Self {
        Self {
            id: MemberId::new(),
            organization_id: invitation.organization_id(),
            person_id: invitation.invited_person_id(),
            member_type,
            joined_at: Utc::now(),
            invitation_id: invitation.id(),
        }
    }

    /// Unique member ID
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Owning organization
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// The affiliated person
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Role classification
    pub fn member_type(&self) -> MemberType {
        self.member_type
    }

    /// When the person joined
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// The accepted invitation this membership came from
    pub fn invitation_id(&self) -> InvitationId {
        self.invitation_id
    }
}
