//! Booking commands.

use chrono::{DateTime, Utc};
use common::{BookingId, UserId};

use crate::command::Command;

use super::{Address, Booking, BookingError, BookingEvent, PetSpecification};

/// Command to request a new booking.
///
/// The price is not part of the command; it is estimated from the route and
/// the pet when the command is handled.
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub owner_id: UserId,
    pub pet_spec: PetSpecification,
    pub pickup_address: Address,
    pub dropoff_address: Address,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl CreateBooking {
    pub fn new(
        owner_id: UserId,
        pet_spec: PetSpecification,
        pickup_address: Address,
        dropoff_address: Address,
    ) -> Self {
        Self {
            owner_id,
            pet_spec,
            pickup_address,
            dropoff_address,
            scheduled_at: None,
            notes: String::new(),
        }
    }

    /// Sets a scheduled pickup time.
    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Command to assign a runner to an open booking.
#[derive(Debug, Clone)]
pub struct AcceptBooking {
    pub booking_id: BookingId,
    pub runner_id: UserId,
}

impl AcceptBooking {
    pub fn new(booking_id: BookingId, runner_id: UserId) -> Self {
        Self {
            booking_id,
            runner_id,
        }
    }
}

impl Command for AcceptBooking {
    type Aggregate = Booking;

    fn aggregate_id(&self) -> BookingId {
        self.booking_id
    }

    fn apply(&self, booking: &mut Booking) -> Result<BookingEvent, BookingError> {
        booking.accept(self.runner_id)
    }
}

/// Command to record that the runner picked up the pet.
#[derive(Debug, Clone)]
pub struct StartDelivery {
    pub booking_id: BookingId,
}

impl StartDelivery {
    pub fn new(booking_id: BookingId) -> Self {
        Self { booking_id }
    }
}

impl Command for StartDelivery {
    type Aggregate = Booking;

    fn aggregate_id(&self) -> BookingId {
        self.booking_id
    }

    fn apply(&self, booking: &mut Booking) -> Result<BookingEvent, BookingError> {
        booking.start_delivery()
    }
}

/// Command to record that the pet was handed over at the dropoff.
#[derive(Debug, Clone)]
pub struct ConfirmDelivery {
    pub booking_id: BookingId,
}

impl ConfirmDelivery {
    pub fn new(booking_id: BookingId) -> Self {
        Self { booking_id }
    }
}

impl Command for ConfirmDelivery {
    type Aggregate = Booking;

    fn aggregate_id(&self) -> BookingId {
        self.booking_id
    }

    fn apply(&self, booking: &mut Booking) -> Result<BookingEvent, BookingError> {
        booking.confirm_delivery()
    }
}

/// Command to close a delivered booking once payment has settled.
///
/// The final price is the booking's estimated price.
#[derive(Debug, Clone)]
pub struct CompleteBooking {
    pub booking_id: BookingId,
}

impl CompleteBooking {
    pub fn new(booking_id: BookingId) -> Self {
        Self { booking_id }
    }
}

impl Command for CompleteBooking {
    type Aggregate = Booking;

    fn aggregate_id(&self) -> BookingId {
        self.booking_id
    }

    fn apply(&self, booking: &mut Booking) -> Result<BookingEvent, BookingError> {
        let final_price = booking.estimated_price();
        booking.complete(final_price)
    }
}

/// Command to cancel a booking that has not reached delivery.
#[derive(Debug, Clone)]
pub struct CancelBooking {
    pub booking_id: BookingId,
    pub cancelled_by: UserId,
    pub reason: String,
}

impl CancelBooking {
    pub fn new(booking_id: BookingId, cancelled_by: UserId, reason: impl Into<String>) -> Self {
        Self {
            booking_id,
            cancelled_by,
            reason: reason.into(),
        }
    }
}

impl Command for CancelBooking {
    type Aggregate = Booking;

    fn aggregate_id(&self) -> BookingId {
        self.booking_id
    }

    fn apply(&self, booking: &mut Booking) -> Result<BookingEvent, BookingError> {
        booking.cancel(self.reason.clone(), self.cancelled_by)
    }
}

/// Command to request a fresh booking with the same pet and route as an
/// earlier one.
#[derive(Debug, Clone)]
pub struct RebookBooking {
    pub owner_id: UserId,
    pub original_booking_id: BookingId,
}

impl RebookBooking {
    pub fn new(owner_id: UserId, original_booking_id: BookingId) -> Self {
        Self {
            owner_id,
            original_booking_id,
        }
    }
}
