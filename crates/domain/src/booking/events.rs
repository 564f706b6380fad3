//! Booking domain events.
//!
//! Each successful transition yields exactly one event. Event type names are
//! the ones downstream services subscribe to.

use chrono::{DateTime, Utc};
use common::{BookingId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::Money;

/// Events that describe booking transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BookingEvent {
    /// An owner requested transport.
    #[serde(rename = "booking.requested")]
    Requested(BookingRequestedData),

    /// A runner accepted the booking.
    #[serde(rename = "booking.accepted")]
    Accepted(BookingAcceptedData),

    /// The runner picked up the pet.
    #[serde(rename = "booking.pet_picked_up")]
    PetPickedUp(PetPickedUpData),

    /// The runner delivered the pet.
    #[serde(rename = "booking.delivery_confirmed")]
    DeliveryConfirmed(DeliveryConfirmedData),

    /// Payment settled and the booking is closed.
    #[serde(rename = "booking.completed")]
    Completed(BookingCompletedData),

    /// The booking was cancelled.
    #[serde(rename = "booking.cancelled")]
    Cancelled(BookingCancelledData),
}

impl DomainEvent for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::Requested(_) => "booking.requested",
            BookingEvent::Accepted(_) => "booking.accepted",
            BookingEvent::PetPickedUp(_) => "booking.pet_picked_up",
            BookingEvent::DeliveryConfirmed(_) => "booking.delivery_confirmed",
            BookingEvent::Completed(_) => "booking.completed",
            BookingEvent::Cancelled(_) => "booking.cancelled",
        }
    }
}

impl BookingEvent {
    /// Returns the booking the event belongs to.
    pub fn booking_id(&self) -> BookingId {
        match self {
            BookingEvent::Requested(d) => d.booking_id,
            BookingEvent::Accepted(d) => d.booking_id,
            BookingEvent::PetPickedUp(d) => d.booking_id,
            BookingEvent::DeliveryConfirmed(d) => d.booking_id,
            BookingEvent::Completed(d) => d.booking_id,
            BookingEvent::Cancelled(d) => d.booking_id,
        }
    }

    /// Serializes only the event's data payload, without the type tag.
    pub fn data(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            BookingEvent::Requested(d) => serde_json::to_value(d),
            BookingEvent::Accepted(d) => serde_json::to_value(d),
            BookingEvent::PetPickedUp(d) => serde_json::to_value(d),
            BookingEvent::DeliveryConfirmed(d) => serde_json::to_value(d),
            BookingEvent::Completed(d) => serde_json::to_value(d),
            BookingEvent::Cancelled(d) => serde_json::to_value(d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequestedData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub owner_id: UserId,
    pub pet_type: String,
    pub pet_name: String,
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub estimated_price: Money,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingAcceptedData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub runner_id: UserId,
    pub owner_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetPickedUpData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub runner_id: UserId,
    pub owner_id: UserId,
    pub picked_up_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfirmedData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub runner_id: UserId,
    pub owner_id: UserId,
    pub delivered_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCompletedData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub runner_id: UserId,
    pub owner_id: UserId,
    pub final_price: Money,
    pub currency: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCancelledData {
    pub booking_id: BookingId,
    pub booking_number: String,
    pub cancelled_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}
