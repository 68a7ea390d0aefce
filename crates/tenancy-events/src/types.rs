//! Event types for membership changes
//!
//! Every committed organization command is announced with one of these
//! events so other contexts (projects, notifications) can react.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tenancy_org::{
    InvitationId, InvitationStatus, MemberId, MemberType, OrganizationId, PersonId, TaxId,
};
use uuid::Uuid;

/// Event envelope.
///
/// All events are wrapped in this envelope which provides metadata
/// for routing, tracing, and processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Event type (e.g., "invitation.accepted"), also the routing topic
    pub event_type: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// Organization context
    pub organization_id: Option<OrganizationId>,

    /// Person the event is about
    pub person_id: Option<PersonId>,

    /// Correlation ID for tracing
    pub correlation_id: Option<String>,

    /// Event version for schema evolution
    pub version: u32,

    /// Event payload
    pub payload: serde_json::Value,

    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            organization_id: None,
            person_id: None,
            correlation_id: None,
            version: 1,
            payload,
            metadata: HashMap::new(),
        }
    }

    /// Set organization context.
    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// Set person context.
    pub fn with_person(mut self, person_id: PersonId) -> Self {
        self.person_id = Some(person_id);
        self
    }

    /// Set correlation ID.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get the topic for this event.
    pub fn topic(&self) -> &str {
        &self.event_type
    }

    /// Parse the payload into a specific type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Membership lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipEvent {
    /// Organization was registered
    OrganizationCreated {
        organization_id: OrganizationId,
        tax_id: TaxId,
        created_by: PersonId,
    },
    /// Commercial name changed
    OrganizationUpdated {
        organization_id: OrganizationId,
        commercial_name: String,
    },
    /// Organization was deleted with its members and invitations
    OrganizationDeleted {
        organization_id: OrganizationId,
        tax_id: TaxId,
    },
    /// A person was invited
    InvitationSent {
        organization_id: OrganizationId,
        invitation_id: InvitationId,
        person_id: PersonId,
    },
    /// An invitation was accepted and a member enrolled
    InvitationAccepted {
        organization_id: OrganizationId,
        invitation_id: InvitationId,
        person_id: PersonId,
        member_id: MemberId,
        member_type: MemberType,
    },
    /// An invitation was declined
    InvitationRejected {
        organization_id: OrganizationId,
        invitation_id: InvitationId,
        person_id: PersonId,
    },
    /// A member was removed
    MemberRemoved {
        organization_id: OrganizationId,
        member_id: MemberId,
        person_id: PersonId,
    },
}

impl MembershipEvent {
    /// Topic the event is published under.
    pub fn event_type(&self) -> &'static str {
        match self {
            MembershipEvent::OrganizationCreated { .. } => "organization.created",
            MembershipEvent::OrganizationUpdated { .. } => "organization.updated",
            MembershipEvent::OrganizationDeleted { .. } => "organization.deleted",
            MembershipEvent::InvitationSent { .. } => "invitation.sent",
            MembershipEvent::InvitationAccepted { .. } => "invitation.accepted",
            MembershipEvent::InvitationRejected { .. } => "invitation.rejected",
            MembershipEvent::MemberRemoved { .. } => "member.removed",
        }
    }

    /// Organization the event belongs to.
    pub fn organization_id(&self) -> OrganizationId {
        match self {
            MembershipEvent::OrganizationCreated { organization_id, .. }
            | MembershipEvent::OrganizationUpdated { organization_id, .. }
            | MembershipEvent::OrganizationDeleted { organization_id, .. }
            | MembershipEvent::InvitationSent { organization_id, .. }
            | MembershipEvent::InvitationAccepted { organization_id, .. }
            | MembershipEvent::InvitationRejected { organization_id, .. }
            | MembershipEvent::MemberRemoved { organization_id, .. } => *organization_id,
        }
    }

    /// Person the event is about, if any.
    pub fn person_id(&self) -> Option<PersonId> {
        match self {
            MembershipEvent::OrganizationCreated { created_by, .. } => Some(*created_by),
            MembershipEvent::InvitationSent { person_id, .. }
            | MembershipEvent::InvitationAccepted { person_id, .. }
            | MembershipEvent::InvitationRejected { person_id, .. }
            | MembershipEvent::MemberRemoved { person_id, .. } => Some(*person_id),
            MembershipEvent::OrganizationUpdated { .. }
            | MembershipEvent::OrganizationDeleted { .. } => None,
        }
    }

    /// Invitation status the event leaves behind, for invitation events.
    pub fn invitation_status(&self) -> Option<InvitationStatus> {
        match self {
            MembershipEvent::InvitationSent { .. } => Some(InvitationStatus::Pending),
            MembershipEvent::InvitationAccepted { .. } => Some(InvitationStatus::Accepted),
            MembershipEvent::InvitationRejected { .. } => Some(InvitationStatus::Rejected),
            _ => None,
        }
    }

    /// Convert to generic event.
    pub fn to_event(&self) -> Result<Event, serde_json::Error> {
        let mut event = Event::new(self.event_type(), serde_json::to_value(self)?)
            .with_organization(self.organization_id());
        if let Some(person_id) = self.person_id() {
            event = event.with_person(person_id);
        }
        Ok(event)
    }
}
