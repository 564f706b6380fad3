//! Booking aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod number;
mod pricing;
mod state;
mod value_objects;

pub use aggregate::{Booking, BookingParts, NewBooking};
pub use commands::*;
pub use events::{
    BookingAcceptedData, BookingCancelledData, BookingCompletedData, BookingEvent,
    BookingRequestedData, DeliveryConfirmedData, PetPickedUpData,
};
pub use number::{
    BOOKING_NUMBER_ALPHABET, BookingNumber, RandomSource, SequenceRandomSource,
    ThreadRandomSource,
};
pub use pricing::{PricingError, PricingParams, PricingStrategy, StandardPricing, haversine_km};
pub use state::{BookingStatus, ParseStatusError};
pub use value_objects::{
    Address, CrateRequirement, CrateSize, Money, PetSpecification, PetType, RouteSpecification,
    VaccinationRecord,
};

use thiserror::Error;

/// Errors that can occur during booking operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The transition table forbids moving from `current` to `target`.
    #[error("Invalid state transition: cannot move from {current} to {target}")]
    InvalidStateTransition {
        current: BookingStatus,
        target: BookingStatus,
    },

    /// The price could not be estimated.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),
}

impl BookingError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        BookingError::Validation(message.into())
    }
}
