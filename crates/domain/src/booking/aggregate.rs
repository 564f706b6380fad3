//! Booking aggregate implementation.

use chrono::{DateTime, Utc};
use common::{BookingId, UserId, Version};

use crate::aggregate::Aggregate;

use super::{
    Address, BookingError, BookingEvent, BookingNumber, BookingStatus, CrateRequirement, Money,
    PetSpecification, PetType, RandomSource, RouteSpecification,
    events::{
        BookingAcceptedData, BookingCancelledData, BookingCompletedData, BookingRequestedData,
        DeliveryConfirmedData, PetPickedUpData,
    },
};

/// Validated input for creating a booking.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub owner_id: UserId,
    pub pet_spec: PetSpecification,
    pub pickup_address: Address,
    pub dropoff_address: Address,
    pub estimated_price: Money,
    pub currency: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: String,
}

/// Every field of a booking, used to rebuild one from storage.
///
/// No validation happens on reconstruction: the stored row is trusted.
#[derive(Debug, Clone)]
pub struct BookingParts {
    pub id: BookingId,
    pub booking_number: BookingNumber,
    pub owner_id: UserId,
    pub runner_id: Option<UserId>,
    pub status: BookingStatus,
    pub pet_spec: PetSpecification,
    pub crate_requirement: CrateRequirement,
    pub pickup_address: Address,
    pub dropoff_address: Address,
    pub route_spec: Option<RouteSpecification>,
    pub estimated_price: Money,
    pub final_price: Option<Money>,
    pub currency: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_note: String,
    pub notes: String,
    pub version: Version,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking aggregate root.
///
/// Represents one pet-transport request from creation through delivery to
/// completion or cancellation. All state changes go through the command
/// methods below, each of which checks the transition table first.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    id: BookingId,
    booking_number: BookingNumber,
    owner_id: UserId,
    runner_id: Option<UserId>,
    status: BookingStatus,
    pet_spec: PetSpecification,
    crate_requirement: CrateRequirement,
    pickup_address: Address,
    dropoff_address: Address,
    route_spec: Option<RouteSpecification>,
    estimated_price: Money,
    final_price: Option<Money>,
    currency: String,
    scheduled_at: Option<DateTime<Utc>>,
    picked_up_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancel_note: String,
    notes: String,
    version: Version,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Booking {
    type Id = BookingId;
    type Event = BookingEvent;
    type Error = BookingError;

    fn aggregate_type() -> &'static str {
        "Booking"
    }

    fn id(&self) -> BookingId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn increment_version(&mut self) {
        self.version = self.version.next();
        self.updated_at = Utc::now();
    }
}

// Construction
impl Booking {
    /// Creates a new booking in the `requested` status at version 1.
    ///
    /// The crate requirement is derived from the pet specification and the
    /// booking number is drawn from `rng`.
    pub fn create(
        input: NewBooking,
        rng: &dyn RandomSource,
    ) -> Result<(Self, BookingEvent), BookingError> {
        Self::validate_request(
            input.owner_id,
            &input.pet_spec,
            &input.pickup_address,
            &input.dropoff_address,
        )?;
        if !input.estimated_price.is_positive() {
            return Err(BookingError::validation("estimated price must be positive"));
        }

        let now = Utc::now();
        let booking = Self {
            id: BookingId::new(),
            booking_number: BookingNumber::generate(rng),
            owner_id: input.owner_id,
            runner_id: None,
            status: BookingStatus::Requested,
            crate_requirement: CrateRequirement::for_pet(&input.pet_spec),
            pet_spec: input.pet_spec,
            pickup_address: input.pickup_address,
            dropoff_address: input.dropoff_address,
            route_spec: None,
            estimated_price: input.estimated_price,
            final_price: None,
            currency: input.currency,
            scheduled_at: input.scheduled_at,
            picked_up_at: None,
            delivered_at: None,
            cancelled_at: None,
            cancel_note: String::new(),
            notes: input.notes,
            version: Version::first(),
            created_at: now,
            updated_at: now,
        };

        let event = BookingEvent::Requested(BookingRequestedData {
            booking_id: booking.id,
            booking_number: booking.booking_number.to_string(),
            owner_id: booking.owner_id,
            pet_type: booking.pet_spec.pet_type.clone(),
            pet_name: booking.pet_spec.name.clone(),
            pickup_lat: booking.pickup_address.latitude,
            pickup_lng: booking.pickup_address.longitude,
            dropoff_lat: booking.dropoff_address.latitude,
            dropoff_lng: booking.dropoff_address.longitude,
            estimated_price: booking.estimated_price,
            currency: booking.currency.clone(),
            occurred_at: now,
        });

        Ok((booking, event))
    }

    /// Checks a booking request before it is priced.
    ///
    /// Rules run in a fixed order and the first failure is reported. Returns
    /// the recognized pet type.
    pub fn validate_request(
        owner_id: UserId,
        pet_spec: &PetSpecification,
        pickup: &Address,
        dropoff: &Address,
    ) -> Result<PetType, BookingError> {
        if owner_id.is_nil() {
            return Err(BookingError::validation("owner ID is required"));
        }
        if pet_spec.name.trim().is_empty() {
            return Err(BookingError::validation("pet name is required"));
        }
        let pet_type = pet_spec.kind().ok_or_else(|| {
            BookingError::validation(format!("invalid pet type: {}", pet_spec.pet_type))
        })?;
        // Stored as JSON, which has no representation for NaN or infinity.
        if !(pet_spec.weight_kg.is_finite() && pet_spec.weight_kg > 0.0) {
            return Err(BookingError::validation("pet weight must be positive"));
        }
        if pickup.line1.trim().is_empty() {
            return Err(BookingError::validation("pickup address is required"));
        }
        if dropoff.line1.trim().is_empty() {
            return Err(BookingError::validation("dropoff address is required"));
        }
        if !(pickup.has_finite_coordinates() && dropoff.has_finite_coordinates()) {
            return Err(BookingError::validation("address coordinates must be finite"));
        }
        Ok(pet_type)
    }

    /// Rebuilds a booking from stored parts.
    pub fn reconstruct(parts: BookingParts) -> Self {
        Self {
            id: parts.id,
            booking_number: parts.booking_number,
            owner_id: parts.owner_id,
            runner_id: parts.runner_id,
            status: parts.status,
            pet_spec: parts.pet_spec,
            crate_requirement: parts.crate_requirement,
            pickup_address: parts.pickup_address,
            dropoff_address: parts.dropoff_address,
            route_spec: parts.route_spec,
            estimated_price: parts.estimated_price,
            final_price: parts.final_price,
            currency: parts.currency,
            scheduled_at: parts.scheduled_at,
            picked_up_at: parts.picked_up_at,
            delivered_at: parts.delivered_at,
            cancelled_at: parts.cancelled_at,
            cancel_note: parts.cancel_note,
            notes: parts.notes,
            version: parts.version,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }
}

// Query methods
impl Booking {
    pub fn booking_number(&self) -> &BookingNumber {
        &self.booking_number
    }

    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the assigned runner, if the booking has been accepted.
    pub fn runner_id(&self) -> Option<UserId> {
        self.runner_id
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn pet_spec(&self) -> &PetSpecification {
        &self.pet_spec
    }

    pub fn crate_requirement(&self) -> &CrateRequirement {
        &self.crate_requirement
    }

    pub fn pickup_address(&self) -> &Address {
        &self.pickup_address
    }

    pub fn dropoff_address(&self) -> &Address {
        &self.dropoff_address
    }

    pub fn route_spec(&self) -> Option<&RouteSpecification> {
        self.route_spec.as_ref()
    }

    pub fn estimated_price(&self) -> Money {
        self.estimated_price
    }

    /// Returns the final price, set only once the booking is completed.
    pub fn final_price(&self) -> Option<Money> {
        self.final_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    pub fn picked_up_at(&self) -> Option<DateTime<Utc>> {
        self.picked_up_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn cancel_note(&self) -> &str {
        &self.cancel_note
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the booking is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_transition(&self, target: BookingStatus) -> Result<(), BookingError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(BookingError::InvalidStateTransition {
                current: self.status,
                target,
            })
        }
    }

    fn assigned_runner(&self) -> UserId {
        self.runner_id.unwrap_or_else(UserId::nil)
    }
}

// Command methods (mutate and return the event)
impl Booking {
    /// Assigns a runner and moves the booking to `accepted`.
    pub fn accept(&mut self, runner_id: UserId) -> Result<BookingEvent, BookingError> {
        self.ensure_transition(BookingStatus::Accepted)?;
        if runner_id.is_nil() {
            return Err(BookingError::validation("runner ID is required"));
        }

        let now = Utc::now();
        self.runner_id = Some(runner_id);
        self.status = BookingStatus::Accepted;
        self.updated_at = now;

        Ok(BookingEvent::Accepted(BookingAcceptedData {
            booking_id: self.id,
            booking_number: self.booking_number.to_string(),
            runner_id,
            owner_id: self.owner_id,
            occurred_at: now,
        }))
    }

    /// Marks the pet as picked up and moves the booking to `in_progress`.
    pub fn start_delivery(&mut self) -> Result<BookingEvent, BookingError> {
        self.ensure_transition(BookingStatus::InProgress)?;

        let now = Utc::now();
        self.status = BookingStatus::InProgress;
        self.picked_up_at = Some(now);
        self.updated_at = now;

        Ok(BookingEvent::PetPickedUp(PetPickedUpData {
            booking_id: self.id,
            booking_number: self.booking_number.to_string(),
            runner_id: self.assigned_runner(),
            owner_id: self.owner_id,
            picked_up_at: now,
            occurred_at: now,
        }))
    }

    /// Marks the pet as handed over and moves the booking to `delivered`.
    pub fn confirm_delivery(&mut self) -> Result<BookingEvent, BookingError> {
        self.ensure_transition(BookingStatus::Delivered)?;

        let now = Utc::now();
        self.status = BookingStatus::Delivered;
        self.delivered_at = Some(now);
        self.updated_at = now;

        Ok(BookingEvent::DeliveryConfirmed(DeliveryConfirmedData {
            booking_id: self.id,
            booking_number: self.booking_number.to_string(),
            runner_id: self.assigned_runner(),
            owner_id: self.owner_id,
            delivered_at: now,
            occurred_at: now,
        }))
    }

    /// Records the final price and moves the booking to `completed`.
    pub fn complete(&mut self, final_price: Money) -> Result<BookingEvent, BookingError> {
        self.ensure_transition(BookingStatus::Completed)?;

        let now = Utc::now();
        self.status = BookingStatus::Completed;
        self.final_price = Some(final_price);
        self.updated_at = now;

        Ok(BookingEvent::Completed(BookingCompletedData {
            booking_id: self.id,
            booking_number: self.booking_number.to_string(),
            runner_id: self.assigned_runner(),
            owner_id: self.owner_id,
            final_price,
            currency: self.currency.clone(),
            occurred_at: now,
        }))
    }

    /// Cancels the booking, recording the reason.
    pub fn cancel(
        &mut self,
        reason: impl Into<String>,
        cancelled_by: UserId,
    ) -> Result<BookingEvent, BookingError> {
        if !self.status.can_cancel() {
            return Err(BookingError::InvalidStateTransition {
                current: self.status,
                target: BookingStatus::Cancelled,
            });
        }

        let now = Utc::now();
        let reason = reason.into();
        self.status = BookingStatus::Cancelled;
        self.cancel_note = reason.clone();
        self.cancelled_at = Some(now);
        self.updated_at = now;

        Ok(BookingEvent::Cancelled(BookingCancelledData {
            booking_id: self.id,
            booking_number: self.booking_number.to_string(),
            cancelled_by,
            reason,
            occurred_at: now,
        }))
    }

    /// Attaches a computed route.
    pub fn set_route_spec(&mut self, route_spec: Option<RouteSpecification>) {
        self.route_spec = route_spec;
        self.updated_at = Utc::now();
    }
}
