use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{BookingId, UserId, Version};

/// A booking as it is persisted: one flat row keyed by the booking id.
///
/// Nested value objects (pet specification, crate requirement, addresses,
/// route) are carried as JSON documents so the store stays independent of
/// the domain types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub booking_number: String,
    pub owner_id: UserId,
    pub runner_id: Option<UserId>,

    /// Status name as stored (e.g. "requested", "in_progress").
    pub status: String,

    pub pet_spec: serde_json::Value,
    pub crate_requirement: serde_json::Value,
    pub pickup_address: serde_json::Value,
    pub dropoff_address: serde_json::Value,
    pub route_spec: Option<serde_json::Value>,

    pub estimated_price_cents: i64,
    pub final_price_cents: Option<i64>,
    pub currency: String,

    pub scheduled_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_note: String,
    pub notes: String,

    /// Version the row will hold once this record is written.
    pub version: Version,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Encodes a value object as a JSON document for storage.
    pub fn encode<T: Serialize>(value: &T) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(value)
    }

    /// Decodes a stored JSON document into a value object.
    pub fn decode<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, serde_json::Error> {
        T::deserialize(value)
    }

    /// Returns the version the stored row must hold for an update of this
    /// record to apply.
    pub fn expected_stored_version(&self) -> Version {
        self.version.prev()
    }
}
