//! Domain layer for pet-transport bookings.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for version-guarded entities
//! - DomainEvent trait for domain events
//! - Command trait and CommandResult for command processing
//! - Booking aggregate with its state machine, pricing and number generation
//! - BookingRepository mapping bookings onto the versioned record store

pub mod aggregate;
pub mod booking;
pub mod command;
pub mod error;
pub mod repository;

pub use aggregate::{Aggregate, DomainEvent};
pub use booking::{
    AcceptBooking, Address, Booking, BookingError, BookingEvent, BookingNumber, BookingParts,
    BookingStatus, CancelBooking, CompleteBooking, ConfirmDelivery, CrateRequirement, CrateSize,
    CreateBooking, Money, NewBooking, PetSpecification, PetType, PricingError, PricingParams,
    PricingStrategy, RandomSource, RebookBooking, RouteSpecification, SequenceRandomSource,
    StandardPricing, StartDelivery, ThreadRandomSource, VaccinationRecord, haversine_km,
};
pub use command::{Command, CommandResult};
pub use error::DomainError;
pub use repository::BookingRepository;
