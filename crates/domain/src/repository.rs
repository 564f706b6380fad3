//! Booking persistence on top of a versioned record store.
//!
//! [`BookingRepository`] maps bookings to flat store records and back, and
//! runs the load, transition, bump, conditional-write cycle every mutating
//! command goes through.

use std::collections::HashMap;

use booking_store::{BookingRecord, BookingStore, Page, PageRequest, StoreError};
use common::{BookingId, UserId};

use crate::aggregate::Aggregate;
use crate::booking::{
    Booking, BookingError, BookingEvent, BookingNumber, BookingParts, BookingStatus, Money,
};
use crate::command::{Command, CommandResult};
use crate::error::DomainError;

/// Repository for booking aggregates.
#[derive(Debug, Clone)]
pub struct BookingRepository<S: BookingStore> {
    store: S,
}

impl<S: BookingStore> BookingRepository<S> {
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads a booking by id, returning None if it doesn't exist.
    pub async fn find(&self, booking_id: BookingId) -> Result<Option<Booking>, DomainError> {
        self.store
            .find_by_id(booking_id)
            .await?
            .map(from_record)
            .transpose()
    }

    /// Loads a booking by id.
    pub async fn load(&self, booking_id: BookingId) -> Result<Booking, DomainError> {
        self.find(booking_id)
            .await?
            .ok_or_else(|| DomainError::AggregateNotFound {
                aggregate_type: Booking::aggregate_type(),
                aggregate_id: booking_id.to_string(),
            })
    }

    /// Loads a booking by its human-readable number.
    pub async fn find_by_number(&self, number: &str) -> Result<Option<Booking>, DomainError> {
        self.store
            .find_by_number(number)
            .await?
            .map(from_record)
            .transpose()
    }

    pub async fn find_by_owner(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Booking>, DomainError> {
        self.store
            .find_by_owner_id(owner_id, page)
            .await?
            .try_map(from_record)
    }

    pub async fn find_by_runner(
        &self,
        runner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Booking>, DomainError> {
        self.store
            .find_by_runner_id(runner_id, page)
            .await?
            .try_map(from_record)
    }

    pub async fn list_all(&self, page: PageRequest) -> Result<Page<Booking>, DomainError> {
        self.store.list_all(page).await?.try_map(from_record)
    }

    /// Counts bookings per status. Statuses with no bookings are absent.
    pub async fn count_by_status(&self) -> Result<HashMap<BookingStatus, i64>, DomainError> {
        let counts = self.store.count_by_status().await?;

        let mut by_status = HashMap::with_capacity(counts.len());
        for (status, count) in counts {
            let status = status
                .parse::<BookingStatus>()
                .map_err(|e| DomainError::Store(StoreError::InvalidRecord(e.to_string())))?;
            by_status.insert(status, count);
        }
        Ok(by_status)
    }

    /// Persists a newly created booking.
    pub async fn insert(&self, booking: &Booking) -> Result<(), DomainError> {
        self.store.insert(to_record(booking)?).await?;
        Ok(())
    }

    /// Writes a mutated booking whose version has already been bumped.
    ///
    /// Fails with [`DomainError::Conflict`] when the stored row is no longer
    /// at `booking.version() - 1`.
    pub async fn update(&self, booking: &Booking) -> Result<(), DomainError> {
        self.store.update(to_record(booking)?).await?;
        Ok(())
    }

    /// Runs a command against its target booking and commits the result.
    pub async fn handle<C>(&self, cmd: &C) -> Result<CommandResult<Booking>, DomainError>
    where
        C: Command<Aggregate = Booking>,
    {
        self.execute(cmd.aggregate_id(), |booking| cmd.apply(booking))
            .await
    }

    /// Executes a transition against a stored booking and commits it.
    ///
    /// The closure receives the loaded booking and returns the event for the
    /// transition it applied. On success the version is bumped and the
    /// booking written back; a rejected transition writes nothing.
    pub async fn execute<F>(
        &self,
        booking_id: BookingId,
        command_fn: F,
    ) -> Result<CommandResult<Booking>, DomainError>
    where
        F: FnOnce(&mut Booking) -> Result<BookingEvent, BookingError>,
    {
        let mut booking = self.load(booking_id).await?;

        let event = command_fn(&mut booking)?;

        booking.increment_version();
        self.update(&booking).await?;

        let new_version = booking.version();
        tracing::debug!(
            booking_id = %booking_id,
            version = %new_version,
            status = %booking.status(),
            "booking committed"
        );

        Ok(CommandResult {
            aggregate: booking,
            event,
            new_version,
        })
    }
}

/// Converts a booking into its persisted form.
pub fn to_record(booking: &Booking) -> Result<BookingRecord, DomainError> {
    Ok(BookingRecord {
        id: booking.id(),
        booking_number: booking.booking_number().to_string(),
        owner_id: booking.owner_id(),
        runner_id: booking.runner_id(),
        status: booking.status().as_str().to_string(),
        pet_spec: BookingRecord::encode(booking.pet_spec())?,
        crate_requirement: BookingRecord::encode(booking.crate_requirement())?,
        pickup_address: BookingRecord::encode(booking.pickup_address())?,
        dropoff_address: BookingRecord::encode(booking.dropoff_address())?,
        route_spec: booking.route_spec().map(BookingRecord::encode).transpose()?,
        estimated_price_cents: booking.estimated_price().cents(),
        final_price_cents: booking.final_price().map(|p| p.cents()),
        currency: booking.currency().to_string(),
        scheduled_at: booking.scheduled_at(),
        picked_up_at: booking.picked_up_at(),
        delivered_at: booking.delivered_at(),
        cancelled_at: booking.cancelled_at(),
        cancel_note: booking.cancel_note().to_string(),
        notes: booking.notes().to_string(),
        version: booking.version(),
        created_at: booking.created_at(),
        updated_at: booking.updated_at(),
    })
}

/// Rebuilds a booking from a persisted row.
pub fn from_record(record: BookingRecord) -> Result<Booking, DomainError> {
    let booking_id = record.id;
    let corrupt = |reason: String| DomainError::CorruptRecord { booking_id, reason };

    let status: BookingStatus = record.status.parse().map_err(|e| corrupt(format!("{e}")))?;
    let decode_err = |field: &str, e: serde_json::Error| corrupt(format!("{field}: {e}"));

    Ok(Booking::reconstruct(BookingParts {
        id: record.id,
        booking_number: BookingNumber::from_stored(record.booking_number),
        owner_id: record.owner_id,
        runner_id: record.runner_id,
        status,
        pet_spec: BookingRecord::decode(&record.pet_spec).map_err(|e| decode_err("pet_spec", e))?,
        crate_requirement: BookingRecord::decode(&record.crate_requirement)
            .map_err(|e| decode_err("crate_requirement", e))?,
        pickup_address: BookingRecord::decode(&record.pickup_address)
            .map_err(|e| decode_err("pickup_address", e))?,
        dropoff_address: BookingRecord::decode(&record.dropoff_address)
            .map_err(|e| decode_err("dropoff_address", e))?,
        route_spec: record
            .route_spec
            .as_ref()
            .map(BookingRecord::decode)
            .transpose()
            .map_err(|e| decode_err("route_spec", e))?,
        estimated_price: Money::from_cents(record.estimated_price_cents),
        final_price: record.final_price_cents.map(Money::from_cents),
        currency: record.currency,
        scheduled_at: record.scheduled_at,
        picked_up_at: record.picked_up_at,
        delivered_at: record.delivered_at,
        cancelled_at: record.cancelled_at,
        cancel_note: record.cancel_note,
        notes: record.notes,
        version: record.version,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }))
}
