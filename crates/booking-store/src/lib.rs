//! Versioned persistence for bookings.
//!
//! The store works on flat [`BookingRecord`] rows and knows nothing about the
//! booking state machine. Every update is a compare-and-swap on the row's
//! version column: it succeeds only when the stored version is exactly one
//! behind the incoming record.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod record;
pub mod store;

pub use common::{BookingId, UserId, Version};
pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use query::{Page, PageRequest};
pub use record::BookingRecord;
pub use store::{BookingStore, validate_record_for_insert, validate_record_for_update};
