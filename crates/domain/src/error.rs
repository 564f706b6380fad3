//! Domain error types.

use booking_store::StoreError;
use common::{BookingId, Version};
use thiserror::Error;

use crate::booking::BookingError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The booking rejected the command.
    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    /// Aggregate not found.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    AggregateNotFound {
        aggregate_type: &'static str,
        aggregate_id: String,
    },

    /// The stored version moved on since the aggregate was loaded.
    #[error("Version conflict for booking {booking_id}: expected stored version {expected}")]
    Conflict {
        booking_id: BookingId,
        expected: Version,
    },

    /// A unique field is already taken.
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// A stored row could not be turned back into a booking.
    #[error("Corrupt record for booking {booking_id}: {reason}")]
    CorruptRecord { booking_id: BookingId, reason: String },

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if the error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict { .. })
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::VersionConflict {
                booking_id,
                expected,
            } => DomainError::Conflict {
                booking_id,
                expected,
            },
            StoreError::Duplicate { field, value } => DomainError::Duplicate { field, value },
            StoreError::Serialization(e) => DomainError::Serialization(e),
            other => DomainError::Store(other),
        }
    }
}
