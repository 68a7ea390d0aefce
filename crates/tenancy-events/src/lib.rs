//! # Tenancy Events
//!
//! This crate announces committed membership changes to the rest of the
//! backend.
//!
//! ## Overview
//!
//! The tenancy-events crate handles:
//! - **Event Types**: Strongly-typed membership events
//! - **Event Bus**: Publish/subscribe messaging
//! - **Event Handlers**: Async event processing
//!
//! ## Event Types
//!
//! - `organization.created` / `organization.updated` / `organization.deleted`
//! - `invitation.sent` / `invitation.accepted` / `invitation.rejected`
//! - `member.removed`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tenancy_events::{EventBus, MemoryEventBus, MembershipEvent};
//! use tenancy_org::{InvitationId, OrganizationId, PersonId};
//!
//! async fn example() {
//!     let bus = MemoryEventBus::new();
//!     let mut sub = bus.subscribe("invitation.*").await.unwrap();
//!
//!     let sent = MembershipEvent::InvitationSent {
//!         organization_id: OrganizationId::new(),
//!         invitation_id: InvitationId::new(),
//!         person_id: PersonId::new(),
//!     };
//!     bus.publish(sent.to_event().unwrap()).await.unwrap();
//!
//!     let event = sub.recv().await.unwrap();
//!     assert_eq!(event.event_type, "invitation.sent");
//! }
//! ```
//!
//! Wildcards:
//! - `*` matches exactly one segment
//! - `#` matches zero or more segments

pub mod bus;
pub mod types;

// Re-export main types
pub use bus::{
    topic_matches, EventBus, EventBusError, EventBusResult, EventBusStats, EventHandler,
    MemoryEventBus, Subscription,
};
pub use types::{Event, MembershipEvent};
