//! Topic names, event type names and inbound payloads.

use chrono::{DateTime, Utc};
use common::{BookingId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic the booking service publishes its events on.
pub const BOOKING_EVENTS_TOPIC: &str = "booking.events";

/// Topic the payment service publishes its events on.
pub const PAYMENT_EVENTS_TOPIC: &str = "payment.events";

/// Default `source` attribute for envelopes produced here.
pub const SERVICE_SOURCE: &str = "service-booking";

/// Payment settled and the runner's payout was released from escrow.
pub const PAYMENT_ESCROW_RELEASED: &str = "payment.escrow_released";

/// Payload of `payment.escrow_released`.
///
/// Only `booking_id` drives the booking side; the rest is carried for logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscrowReleasedData {
    #[serde(default)]
    pub payment_id: Option<Uuid>,
    pub booking_id: BookingId,
    #[serde(default)]
    pub runner_id: Option<UserId>,
    #[serde(default)]
    pub runner_payout: i64,
    #[serde(default)]
    pub platform_fee: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}
