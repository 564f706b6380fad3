//! Consumer for inbound payment events.
//!
//! Delivery is at-least-once. A redelivered `payment.escrow_released` hits a
//! booking that is already completed, the transition is rejected, and the
//! message is treated as handled. Nothing here ever asks for a redelivery.

use std::sync::Arc;

use booking_store::BookingStore;
use common::BookingId;
use domain::CompleteBooking;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::envelope::IntegrationEvent;
use crate::error::ErrorKind;
use crate::publisher::EventPublisher;
use crate::service::BookingService;
use crate::topics::{EscrowReleasedData, PAYMENT_ESCROW_RELEASED};

/// Why a message was dropped without touching any booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The bytes were not a valid envelope.
    MalformedEnvelope,
    /// The envelope's data did not match the event type.
    MalformedData,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MalformedEnvelope => "malformed_envelope",
            DropReason::MalformedData => "malformed_data",
        }
    }
}

/// What happened to one inbound message. Every outcome counts as handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// The booking was completed.
    Completed(BookingId),
    /// The completion was rejected; the error kind says why.
    Rejected { booking_id: BookingId, kind: ErrorKind },
    /// The event type is not one this consumer acts on.
    Ignored(String),
    Dropped(DropReason),
}

/// Completes bookings when payment escrow is released.
pub struct PaymentEventConsumer<S: BookingStore, P: EventPublisher> {
    service: Arc<BookingService<S, P>>,
}

impl<S: BookingStore, P: EventPublisher> PaymentEventConsumer<S, P> {
    pub fn new(service: Arc<BookingService<S, P>>) -> Self {
        Self { service }
    }

    /// Handles one raw message from the payment topic.
    pub async fn handle_message(&self, payload: &[u8]) -> MessageOutcome {
        metrics::counter!("payment_events_received_total").increment(1);

        let envelope = match IntegrationEvent::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw = %String::from_utf8_lossy(payload),
                    "failed to parse envelope from payment topic"
                );
                return self.drop_message(DropReason::MalformedEnvelope);
            }
        };

        match envelope.event_type.as_str() {
            PAYMENT_ESCROW_RELEASED => self.handle_escrow_released(&envelope).await,
            other => {
                tracing::debug!(event_type = other, "ignoring unhandled payment event type");
                MessageOutcome::Ignored(other.to_string())
            }
        }
    }

    async fn handle_escrow_released(&self, envelope: &IntegrationEvent) -> MessageOutcome {
        let data: EscrowReleasedData = match envelope.parse_data() {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_id = %envelope.id,
                    "failed to parse escrow released data"
                );
                return self.drop_message(DropReason::MalformedData);
            }
        };

        let booking_id = data.booking_id;
        tracing::info!(
            booking_id = %booking_id,
            payment_id = ?data.payment_id,
            "processing escrow released event"
        );

        match self
            .service
            .complete_booking(CompleteBooking::new(booking_id))
            .await
        {
            Ok(_) => {
                tracing::info!(booking_id = %booking_id, "booking completed after escrow release");
                MessageOutcome::Completed(booking_id)
            }
            Err(e) => {
                tracing::error!(
                    booking_id = %booking_id,
                    error = %e,
                    "failed to complete booking after escrow release"
                );
                MessageOutcome::Rejected {
                    booking_id,
                    kind: e.kind(),
                }
            }
        }
    }

    fn drop_message(&self, reason: DropReason) -> MessageOutcome {
        metrics::counter!("payment_events_dropped_total", "reason" => reason.as_str())
            .increment(1);
        MessageOutcome::Dropped(reason)
    }

    /// Pulls messages one at a time until the stream ends or `shutdown` is
    /// cancelled.
    pub async fn run<M, B>(&self, mut messages: M, shutdown: CancellationToken)
    where
        M: Stream<Item = B> + Unpin + Send,
        B: AsRef<[u8]> + Send,
    {
        tracing::info!("payment event consumer started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("payment event consumer stopping");
                    break;
                }
                next = messages.next() => match next {
                    Some(message) => {
                        self.handle_message(message.as_ref()).await;
                    }
                    None => {
                        tracing::info!("payment event stream ended");
                        break;
                    }
                },
            }
        }
    }
}
