//! Booking state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The status of a booking in its lifecycle.
///
/// State transitions:
/// ```text
/// Requested ──► Accepted ──► InProgress ──► Delivered ──► Completed
///     │            │             │
///     └────────────┴─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Owner has requested transport, no runner yet.
    #[default]
    Requested,

    /// A runner has accepted the booking.
    Accepted,

    /// The pet has been picked up and is on its way.
    InProgress,

    /// The pet has been handed over at the dropoff.
    Delivered,

    /// Payment has settled (terminal state).
    Completed,

    /// Booking was cancelled (terminal state).
    Cancelled,
}

impl BookingStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [BookingStatus; 6] = [
        BookingStatus::Requested,
        BookingStatus::Accepted,
        BookingStatus::InProgress,
        BookingStatus::Delivered,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    /// Returns the statuses reachable in one step from this status.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            BookingStatus::Requested => &[BookingStatus::Accepted, BookingStatus::Cancelled],
            BookingStatus::Accepted => &[BookingStatus::InProgress, BookingStatus::Cancelled],
            BookingStatus::InProgress => &[BookingStatus::Delivered, BookingStatus::Cancelled],
            BookingStatus::Delivered => &[BookingStatus::Completed],
            BookingStatus::Completed | BookingStatus::Cancelled => &[],
        }
    }

    /// Returns true if moving to `target` is a legal transition.
    pub fn can_transition_to(&self, target: BookingStatus) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Returns true if the booking can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        self.can_transition_to(BookingStatus::Cancelled)
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "requested",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a stored status string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid booking status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for BookingStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
