//! Event publisher trait and implementations.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::envelope::IntegrationEvent;

/// Errors raised by a publisher.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The broker refused or could not be reached.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for sending envelopes to the message broker.
///
/// `key` is the partitioning key; booking events use the booking id so all
/// events for one booking stay ordered.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        event: &IntegrationEvent,
    ) -> Result<(), PublishError>;
}

#[async_trait]
impl<P: EventPublisher + ?Sized> EventPublisher for Arc<P> {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        event: &IntegrationEvent,
    ) -> Result<(), PublishError> {
        (**self).publish(topic, key, event).await
    }
}

/// A message captured by [`InMemoryEventPublisher`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub key: String,
    pub event: IntegrationEvent,
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    messages: Vec<PublishedMessage>,
    fail_on_publish: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a new in-memory publisher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following publish call fail until reset.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }

    /// Returns all captured messages in publish order.
    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.state.read().await.messages.clone()
    }

    /// Returns the event types published on `topic`, in order.
    pub async fn event_types(&self, topic: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.topic == topic)
            .map(|m| m.event.event_type.clone())
            .collect()
    }

    /// Returns the number of captured messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        event: &IntegrationEvent,
    ) -> Result<(), PublishError> {
        let mut state = self.state.write().await;

        if state.fail_on_publish {
            return Err(PublishError::Unavailable("broker is down".to_string()));
        }

        state.messages.push(PublishedMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            event: event.clone(),
        });
        Ok(())
    }
}

/// Publisher that writes each envelope to the log instead of a broker.
///
/// Used when the service runs without a broker connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        event: &IntegrationEvent,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&event.data)?;
        tracing::info!(
            topic,
            key,
            event_id = %event.id,
            event_type = %event.event_type,
            payload = %payload,
            "event published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> IntegrationEvent {
        IntegrationEvent::builder()
            .source("service-booking")
            .event_type("booking.accepted")
            .data_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_captures_messages() {
        let publisher = InMemoryEventPublisher::new();
        publisher
            .publish("booking.events", "key-1", &envelope())
            .await
            .unwrap();

        let messages = publisher.messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].topic, "booking.events");
        assert_eq!(messages[0].key, "key-1");
        assert_eq!(
            publisher.event_types("booking.events").await,
            vec!["booking.accepted"]
        );
        assert!(publisher.event_types("payment.events").await.is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_failure_toggle() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on_publish(true).await;

        let result = publisher.publish("booking.events", "k", &envelope()).await;
        assert!(matches!(result, Err(PublishError::Unavailable(_))));
        assert_eq!(publisher.message_count().await, 0);

        publisher.set_fail_on_publish(false).await;
        publisher
            .publish("booking.events", "k", &envelope())
            .await
            .unwrap();
        assert_eq!(publisher.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_shared_publisher_through_arc() {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let shared: Arc<dyn EventPublisher> = publisher.clone();

        shared
            .publish("booking.events", "k", &envelope())
            .await
            .unwrap();
        assert_eq!(publisher.message_count().await, 1);
    }

    #[tokio::test]
    async fn test_logging_publisher_accepts_everything() {
        LoggingEventPublisher
            .publish("booking.events", "k", &envelope())
            .await
            .unwrap();
    }
}
