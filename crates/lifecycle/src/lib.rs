//! Booking lifecycle orchestration.
//!
//! This crate drives bookings through their transitions on top of the
//! versioned store, publishes an integration event after every committed
//! transition, and completes delivered bookings when the payment service
//! reports that escrow was released.
//!
//! Flow for every mutating use case:
//! 1. Load the booking
//! 2. Apply the transition on the aggregate
//! 3. Bump the version and write it back with a compare-and-swap
//! 4. Publish the event after the commit

pub mod consumer;
pub mod envelope;
pub mod error;
pub mod publisher;
pub mod service;
pub mod topics;

pub use consumer::{DropReason, MessageOutcome, PaymentEventConsumer};
pub use envelope::{EnvelopeError, IntegrationEvent};
pub use error::{ErrorKind, LifecycleError, Result};
pub use publisher::{
    EventPublisher, InMemoryEventPublisher, LoggingEventPublisher, PublishError, PublishedMessage,
};
pub use service::{BookingService, BookingStats, LifecycleSettings};
pub use topics::EscrowReleasedData;
