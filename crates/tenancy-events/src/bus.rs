//! Event bus implementation
//!
//! This module provides the event bus abstraction and an in-process
//! implementation for publishing and subscribing to membership events.

use crate::types::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};

/// Event bus error types.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Failed to publish event
    #[error("Failed to publish event: {0}")]
    PublishError(String),

    /// Failed to subscribe
    #[error("Failed to subscribe: {0}")]
    SubscribeError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

impl From<serde_json::Error> for EventBusError {
    fn from(err: serde_json::Error) -> Self {
        EventBusError::SerializationError(err.to_string())
    }
}

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Subscription handle for receiving events.
pub struct Subscription {
    /// Subscription ID
    pub id: String,
    /// Topic pattern
    pub topic: String,
    /// Event receiver
    pub receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receive the next event.
    pub async fn recv(&mut self) -> EventBusResult<Event> {
        self.receiver
            .recv()
            .await
            .map_err(|_| EventBusError::ChannelClosed)
    }
}

/// Event handler trait for processing events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: Event) -> EventBusResult<()>;

    /// Get the topics this handler is interested in.
    fn topics(&self) -> Vec<String>;
}

/// Event bus trait for publish/subscribe operations.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: Event) -> EventBusResult<()>;

    /// Subscribe to a topic pattern.
    ///
    /// Topic patterns support wildcards:
    /// - `*` matches any single segment
    /// - `#` matches zero or more segments
    ///
    /// Examples:
    /// - `invitation.*` matches `invitation.sent`, `invitation.accepted`
    /// - `#` matches every event
    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription>;

    /// Register an event handler.
    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()>;

    /// Cancel a subscription by its ID.
    ///
    /// Fails with [`EventBusError::SubscribeError`] for an unknown ID.
    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()>;

    /// Get event bus stats.
    async fn stats(&self) -> EventBusStats;
}

/// Event bus statistics.
#[derive(Debug, Clone, Default)]
pub struct EventBusStats {
    /// Total events published
    pub events_published: u64,
    /// Total deliveries to subscribers and handlers
    pub events_delivered: u64,
    /// Subscriptions still held by a receiver
    pub active_subscriptions: usize,
    /// Registered handlers
    pub registered_handlers: usize,
}

/// Check if a topic matches a pattern.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    segments_match(&pattern, &topic)
}

fn segments_match(pattern: &[&str], topic: &[&str]) -> bool {
    match (pattern.split_first(), topic.split_first()) {
        (None, None) => true,
        (Some((&"#", rest)), _) => {
            (0..=topic.len()).any(|skip| segments_match(rest, &topic[skip..]))
        }
        (Some((&"*", rest)), Some((_, topic_rest))) => segments_match(rest, topic_rest),
        (Some((segment, rest)), Some((head, topic_rest))) => {
            segment == head && segments_match(rest, topic_rest)
        }
        _ => false,
    }
}

/// A live subscription's pattern and the sending half of its channel.
struct SubscriberEntry {
    pattern: String,
    sender: broadcast::Sender<Event>,
}

impl SubscriberEntry {
    /// False once the [`Subscription`] holding the receiver was dropped.
    fn is_live(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

/// In-memory event bus implementation.
///
/// Suitable for single-process deployments and testing. Every subscription
/// gets its own channel, so unsubscribing one never affects another
/// subscription on the same pattern.
pub struct MemoryEventBus {
    /// Subscriptions by ID
    subscribers: Arc<RwLock<HashMap<String, SubscriberEntry>>>,
    /// Registered handlers
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    /// Statistics
    stats: Arc<RwLock<EventBusStats>>,
    /// Default channel capacity
    channel_capacity: usize,
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl MemoryEventBus {
    /// Create a new in-memory event bus.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(EventBusStats::default())),
            channel_capacity: capacity.max(1),
        }
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: Event) -> EventBusResult<()> {
        let topic = event.topic().to_string();
        let mut delivered = 0u64;

        // Notify matching subscribers
        {
            let mut subscribers = self.subscribers.write().await;
            // Subscriptions dropped without unsubscribing
            subscribers.retain(|_, entry| entry.is_live());

            for entry in subscribers.values() {
                if !topic_matches(&entry.pattern, &topic) {
                    continue;
                }
                if entry.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }

        // Notify handlers
        {
            let handlers = self.handlers.read().await;
            for handler in handlers.iter() {
                if handler
                    .topics()
                    .iter()
                    .any(|handler_topic| topic_matches(handler_topic, &topic))
                {
                    let handler = handler.clone();
                    let event = event.clone();
                    delivered += 1;
                    tokio::task::spawn(async move {
                        if let Err(e) = handler.handle(event).await {
                            tracing::error!(error = %e, "Event handler failed");
                        }
                    });
                }
            }
        }

        let mut stats = self.stats.write().await;
        stats.events_published += 1;
        stats.events_delivered += delivered;

        tracing::debug!(topic = %topic, event_id = %event.id, delivered, "Event published");

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription> {
        if topic.is_empty() {
            return Err(EventBusError::SubscribeError(
                "topic pattern cannot be empty".to_string(),
            ));
        }

        let id = uuid::Uuid::now_v7().to_string();
        let (sender, receiver) = broadcast::channel(self.channel_capacity);

        self.subscribers.write().await.insert(
            id.clone(),
            SubscriberEntry {
                pattern: topic.to_string(),
                sender,
            },
        );

        Ok(Subscription {
            id,
            topic: topic.to_string(),
            receiver,
        })
    }

    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()> {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);

        let mut stats = self.stats.write().await;
        stats.registered_handlers = handlers.len();

        Ok(())
    }

    /// Detach a subscription. Its receiver reports
    /// [`EventBusError::ChannelClosed`] once buffered events are drained.
    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()> {
        match self.subscribers.write().await.remove(subscription_id) {
            Some(entry) => {
                tracing::debug!(
                    subscription_id = %subscription_id,
                    topic = %entry.pattern,
                    "Unsubscribed"
                );
                Ok(())
            }
            None => Err(EventBusError::SubscribeError(format!(
                "unknown subscription: {subscription_id}"
            ))),
        }
    }

    async fn stats(&self) -> EventBusStats {
        let mut stats = self.stats.read().await.clone();
        stats.active_subscriptions = self
            .subscribers
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live())
            .count();
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: Event) -> EventBusResult<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn topics(&self) -> Vec<String> {
            vec!["invitation.*".to_string(), "invitation.#".to_string()]
        }
    }

    #[tokio::test]
    async fn test_memory_event_bus_publish_subscribe() {
        let bus = MemoryEventBus::new();

        let mut sub = bus.subscribe("invitation.*").await.unwrap();

        let event = Event::new("invitation.sent", serde_json::json!({}));
        bus.publish(event.clone()).await.unwrap();

        let received = tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, event.id);
    }

    #[tokio::test]
    async fn test_non_matching_subscription_gets_nothing() {
        let bus = MemoryEventBus::new();
        let mut sub = bus.subscribe("member.*").await.unwrap();

        bus.publish(Event::new("invitation.sent", serde_json::json!({})))
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_millis(50), sub.recv()).await;
        assert!(received.is_err());
    }

    #[test]
    fn test_topic_matching() {
        // Exact match
        assert!(topic_matches("invitation.sent", "invitation.sent"));

        // Single wildcard
        assert!(topic_matches("invitation.*", "invitation.accepted"));
        assert!(topic_matches("*.removed", "member.removed"));

        // Multi-segment wildcard
        assert!(topic_matches("#", "organization.created"));
        assert!(topic_matches("organization.#", "organization.created"));
        assert!(topic_matches("organization.#", "organization"));

        // Non-matches
        assert!(!topic_matches("invitation.sent", "invitation.accepted"));
        assert!(!topic_matches("member.*", "invitation.sent"));
        assert!(!topic_matches("*", "invitation.sent"));
        assert!(!topic_matches("invitation.*.x", "invitation.sent"));
    }

    #[tokio::test]
    async fn test_handler_invoked_once_per_event() {
        let bus = MemoryEventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        bus.register_handler(Arc::new(CountingHandler { seen: seen.clone() }))
            .await
            .unwrap();

        bus.publish(Event::new("invitation.rejected", serde_json::json!({})))
            .await
            .unwrap();
        bus.publish(Event::new("organization.created", serde_json::json!({})))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let bus = MemoryEventBus::new();

        let stats = bus.stats().await;
        assert_eq!(stats.events_published, 0);
        assert_eq!(stats.active_subscriptions, 0);

        let _sub = bus.subscribe("organization.*").await.unwrap();
        assert_eq!(bus.stats().await.active_subscriptions, 1);

        bus.publish(Event::new("organization.created", serde_json::json!({})))
            .await
            .unwrap();

        let stats = bus.stats().await;
        assert_eq!(stats.events_published, 1);
        assert_eq!(stats.events_delivered, 1);
    }

    #[tokio::test]
    async fn test_unsubscribed_topic_gets_no_deliveries() {
        let bus = MemoryEventBus::new();
        let mut sub = bus.subscribe("invitation.*").await.unwrap();
        let other = bus.subscribe("invitation.*").await.unwrap();

        bus.unsubscribe(&sub.id).await.unwrap();
        assert_eq!(bus.stats().await.active_subscriptions, 1);

        bus.publish(Event::new("invitation.sent", serde_json::json!({})))
            .await
            .unwrap();

        // Only the remaining subscription on the same pattern is served
        let stats = bus.stats().await;
        assert_eq!(stats.events_delivered, 1);
        assert!(matches!(sub.recv().await, Err(EventBusError::ChannelClosed)));

        bus.unsubscribe(&other.id).await.unwrap();
        assert_eq!(bus.stats().await.active_subscriptions, 0);

        bus.publish(Event::new("invitation.sent", serde_json::json!({})))
            .await
            .unwrap();
        let stats = bus.stats().await;
        assert_eq!(stats.events_published, 2);
        assert_eq!(stats.events_delivered, 1);
    }

    #[tokio::test]
    async fn test_unknown_subscription_id_is_rejected() {
        let bus = MemoryEventBus::new();
        let sub = bus.subscribe("member.*").await.unwrap();

        assert!(matches!(
            bus.unsubscribe("no-such-id").await,
            Err(EventBusError::SubscribeError(_))
        ));
        assert_eq!(bus.stats().await.active_subscriptions, 1);

        bus.unsubscribe(&sub.id).await.unwrap();
        assert!(matches!(
            bus.unsubscribe(&sub.id).await,
            Err(EventBusError::SubscribeError(_))
        ));
        assert_eq!(bus.stats().await.active_subscriptions, 0);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let bus = MemoryEventBus::new();
        let _kept = bus.subscribe("organization.#").await.unwrap();
        let dropped = bus.subscribe("member.removed").await.unwrap();
        assert_eq!(bus.subscribers.read().await.len(), 2);

        drop(dropped);
        assert_eq!(bus.stats().await.active_subscriptions, 1);

        bus.publish(Event::new("member.removed", serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(bus.subscribers.read().await.len(), 1);
        assert_eq!(bus.stats().await.events_delivered, 0);
    }

    #[tokio::test]
    async fn test_empty_topic_is_rejected() {
        let bus = MemoryEventBus::new();
        assert!(matches!(
            bus.subscribe("").await,
            Err(EventBusError::SubscribeError(_))
        ));
    }
}
