//! CloudEvents-style envelope used on the message broker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while building or reading an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("missing envelope field: {0}")]
    MissingField(&'static str),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An event as it travels between services.
///
/// `data` carries the typed payload as plain JSON; the `type` field tells the
/// receiver how to decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    /// Unique identifier for this message.
    pub id: Uuid,

    /// The service that produced the event.
    pub source: String,

    /// The event type (e.g. "booking.accepted").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event was produced.
    pub time: DateTime<Utc>,

    pub data: serde_json::Value,
}

impl IntegrationEvent {
    /// Creates a new envelope builder.
    pub fn builder() -> IntegrationEventBuilder {
        IntegrationEventBuilder::default()
    }

    /// Parses an envelope from raw message bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes the envelope into message bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>, EnvelopeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes the payload into a typed value.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        Ok(T::deserialize(&self.data)?)
    }
}

/// Builder for constructing envelopes.
#[derive(Debug, Default)]
pub struct IntegrationEventBuilder {
    id: Option<Uuid>,
    source: Option<String>,
    event_type: Option<String>,
    time: Option<DateTime<Utc>>,
    data: Option<serde_json::Value>,
}

impl IntegrationEventBuilder {
    /// Sets the message ID. If not set, a new ID will be generated.
    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Sets the time. If not set, the current time will be used.
    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn data<T: Serialize>(mut self, data: &T) -> Result<Self, EnvelopeError> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn data_raw(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Builds the envelope, failing if source, type or data are missing.
    pub fn build(self) -> Result<IntegrationEvent, EnvelopeError> {
        Ok(IntegrationEvent {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            source: self.source.ok_or(EnvelopeError::MissingField("source"))?,
            event_type: self
                .event_type
                .ok_or(EnvelopeError::MissingField("type"))?,
            time: self.time.unwrap_or_else(Utc::now),
            data: self.data.ok_or(EnvelopeError::MissingField("data"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_builder() {
        let envelope = IntegrationEvent::builder()
            .source("service-booking")
            .event_type("booking.accepted")
            .data_raw(serde_json::json!({"booking_number": "BK-ABCDEF"}))
            .build()
            .unwrap();

        assert_eq!(envelope.source, "service-booking");
        assert_eq!(envelope.event_type, "booking.accepted");
        assert_eq!(envelope.data["booking_number"], "BK-ABCDEF");
        assert!(!envelope.id.is_nil());
    }

    #[test]
    fn envelope_build_fails_on_missing_fields() {
        let result = IntegrationEvent::builder().source("service-booking").build();
        assert!(matches!(result, Err(EnvelopeError::MissingField("type"))));
    }

    #[test]
    fn envelope_wire_shape() {
        let envelope = IntegrationEvent::builder()
            .source("service-payment")
            .event_type("payment.escrow_released")
            .data_raw(serde_json::json!({}))
            .build()
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&envelope.to_vec().unwrap()).unwrap();
        assert_eq!(json["type"], "payment.escrow_released");
        assert!(json.get("event_type").is_none());
        assert!(json["id"].is_string());
        assert!(json["time"].is_string());

        let parsed = IntegrationEvent::from_slice(&envelope.to_vec().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn envelope_rejects_garbage() {
        assert!(IntegrationEvent::from_slice(b"not json").is_err());
        assert!(IntegrationEvent::from_slice(br#"{"type":"x"}"#).is_err());
    }
}
