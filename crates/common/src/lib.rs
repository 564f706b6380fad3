//! Shared identifier and version types used across the booking crates.

pub mod types;

pub use types::{BookingId, UserId, Version};
