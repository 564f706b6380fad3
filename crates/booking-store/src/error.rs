use thiserror::Error;

use crate::{BookingId, Version};

/// Errors that can occur when interacting with the booking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional update matched no row: either the stored version is not
    /// the expected one, or the booking no longer exists.
    #[error("Version conflict for booking {booking_id}: expected stored version {expected}")]
    VersionConflict {
        booking_id: BookingId,
        expected: Version,
    },

    /// A booking with the same id or booking number already exists.
    #[error("Duplicate booking {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// The record handed to the store is not valid for the requested write.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true if this error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
