//! Invitation domain model
//!
//! An invitation proposes that a person joins an organization. It starts
//! PENDING and is resolved exactly once, to ACCEPTED or REJECTED. Resolved
//! invitations are kept as history and never change again.
//!
//! ```text
//!            ┌──────────► ACCEPTED
//! PENDING ───┤
//!            └──────────► REJECTED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OrgError, OrgResult};
use crate::ids::{InvitationId, OrganizationId, PersonId};

/// Status of an invitation.
///
/// # Examples
///
/// ```
/// use tenancy_org::InvitationStatus;
///
/// let status = InvitationStatus::Pending;
/// assert!(status.can_transition_to(InvitationStatus::Accepted));
/// assert!(!InvitationStatus::Rejected.can_transition_to(InvitationStatus::Accepted));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    /// Awaiting a response
    Pending,

    /// The invited person joined
    Accepted,

    /// The invited person declined
    Rejected,
}

impl InvitationStatus {
    /// Every status in the catalog.
    pub fn all() -> &'static [Self] {
        &[Self::Pending, Self::Accepted, Self::Rejected]
    }

    /// Terminal statuses have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether `next` is reachable from this status in one step.
    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted) | (Self::Pending, Self::Rejected)
        )
    }

    /// Compute the status after moving to `next`.
    ///
    /// # Errors
    ///
    /// [`OrgError::InvalidStateTransition`] when the move is not allowed.
    pub fn transition_to(self, next: InvitationStatus) -> OrgResult<InvitationStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrgError::InvalidStateTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Parse status from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Catalog name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = OrgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| OrgError::Validation(format!("unknown invitation status: {s}")))
    }
}

/// An invitation for a person to join an organization.
///
/// Invitations are created by
/// [`Organization::add_invitation`](crate::Organization::add_invitation)
/// and resolved through the organization as well; there is no public way to
/// build or mutate one directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    id: InvitationId,
    organization_id: OrganizationId,
    invited_person_id: PersonId,
    status: InvitationStatus,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub(crate) fn new(organization_id: OrganizationId, invited_person_id: PersonId) -> Self {
        Self {
            id: InvitationId::new(),
            organization_id,
            invited_person_id,
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    /// Unique invitation ID
    pub fn id(&self) -> InvitationId {
        self.id
    }

    /// Owning organization
    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Person being invited
    pub fn invited_person_id(&self) -> PersonId {
        self.invited_person_id
    }

    /// Current status
    pub fn status(&self) -> InvitationStatus {
        self.status
    }

    /// When the invitation was issued
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the invitation left PENDING, if it has
    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Whether the invitation is still awaiting a response.
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Move to `next`, leaving the invitation untouched on failure.
    pub(crate) fn transition(&mut self, next: InvitationStatus) -> OrgResult<()> {
        self.status = self.status.transition_to(next)?;
        self.responded_at = Some(Utc::now());
        Ok(())
    }
}
