use std::collections::HashMap;

use async_trait::async_trait;

use crate::{BookingId, BookingRecord, Page, PageRequest, Result, StoreError, UserId, Version};

/// Core trait for booking store implementations.
///
/// Reads are plain pass-through queries. Writes follow an optimistic
/// concurrency protocol: `insert` only accepts brand-new bookings at the
/// first version, and `update` is a compare-and-swap on the stored version.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Retrieves a booking by id.
    ///
    /// Returns None if no such booking exists.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<BookingRecord>>;

    /// Retrieves a booking by its human-readable booking number.
    async fn find_by_number(&self, booking_number: &str) -> Result<Option<BookingRecord>>;

    /// Lists bookings requested by an owner, newest first.
    async fn find_by_owner_id(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>>;

    /// Lists bookings assigned to a runner, newest first.
    async fn find_by_runner_id(
        &self,
        runner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>>;

    /// Lists every booking, newest first.
    async fn list_all(&self, page: PageRequest) -> Result<Page<BookingRecord>>;

    /// Returns the number of bookings per stored status name.
    async fn count_by_status(&self) -> Result<HashMap<String, i64>>;

    /// Persists a new booking.
    ///
    /// Fails with `Duplicate` if the id or booking number is already taken.
    async fn insert(&self, record: BookingRecord) -> Result<()>;

    /// Writes all mutable fields of an existing booking.
    ///
    /// The write applies only if the stored version equals
    /// `record.version - 1`, after which the stored version becomes
    /// `record.version`. When no row matches, either because another writer
    /// got there first or because the booking is gone, the store returns
    /// `VersionConflict`.
    async fn update(&self, record: BookingRecord) -> Result<()>;
}

/// Checks that a record can be written as a brand-new booking.
pub fn validate_record_for_insert(record: &BookingRecord) -> Result<()> {
    if record.booking_number.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "booking number must not be empty".to_string(),
        ));
    }

    if record.version != Version::first() {
        return Err(StoreError::InvalidRecord(format!(
            "new booking must be at version {}, got {}",
            Version::first(),
            record.version
        )));
    }

    Ok(())
}

/// Checks that a record carries a version that can follow a stored one.
pub fn validate_record_for_update(record: &BookingRecord) -> Result<()> {
    if record.version <= Version::first() {
        return Err(StoreError::InvalidRecord(format!(
            "updated booking must be past version {}, got {}",
            Version::first(),
            record.version
        )));
    }

    Ok(())
}
