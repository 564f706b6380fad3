//! NATS adapters for the booking and payment topics.
//!
//! Booking events are published on the booking topic with the booking id in
//! a header. Payment events are read through a queue subscription, so every
//! instance in the consumer group sees each message once.

use async_nats::{Client, ConnectOptions, HeaderMap};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use lifecycle::{EventPublisher, IntegrationEvent, PublishError};
use thiserror::Error;

/// Header carrying the partitioning key of a booking event.
pub const KEY_HEADER: &str = "Booking-Key";

/// Header NATS uses to drop duplicate publishes.
pub const MSG_ID_HEADER: &str = "Nats-Msg-Id";

/// Errors raised while setting up the broker connection.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to connect to NATS at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Failed to subscribe to {subject}: {reason}")]
    Subscribe { subject: String, reason: String },
}

/// Connects to NATS, naming the connection after the service.
pub async fn connect(url: &str, connection_name: &str) -> Result<Client, BrokerError> {
    ConnectOptions::new()
        .name(connection_name)
        .connect(url)
        .await
        .map_err(|e| BrokerError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Subscribes to the payment topic as a member of `group`.
///
/// The stream yields raw payloads and ends when the subscription closes.
pub async fn subscribe_payment_events(
    client: &Client,
    subject: &str,
    group: &str,
) -> Result<BoxStream<'static, Bytes>, BrokerError> {
    let subscriber = client
        .queue_subscribe(subject.to_string(), group.to_string())
        .await
        .map_err(|e| BrokerError::Subscribe {
            subject: subject.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(subject, group, "subscribed to payment events");
    Ok(subscriber.map(|message| message.payload).boxed())
}

/// Builds the headers and body for one booking event.
pub fn encode_event(
    key: &str,
    event: &IntegrationEvent,
) -> Result<(HeaderMap, Bytes), PublishError> {
    let mut headers = HeaderMap::new();
    headers.insert(KEY_HEADER, key);
    headers.insert(MSG_ID_HEADER, event.id.to_string().as_str());

    let payload = serde_json::to_vec(event)?;
    Ok((headers, Bytes::from(payload)))
}

/// Publishes booking events to NATS.
#[derive(Debug, Clone)]
pub struct NatsEventPublisher {
    client: Client,
}

impl NatsEventPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Waits until every buffered publish reached the server.
    pub async fn flush(&self) -> Result<(), PublishError> {
        self.client
            .flush()
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        event: &IntegrationEvent,
    ) -> Result<(), PublishError> {
        let (headers, payload) = encode_event(key, event)?;
        self.client
            .publish_with_headers(topic.to_string(), headers, payload)
            .await
            .map_err(|e| PublishError::Unavailable(e.to_string()))
    }
}
