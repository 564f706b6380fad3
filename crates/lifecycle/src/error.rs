//! Lifecycle error types.

use common::BookingId;
use domain::{BookingError, BookingStatus, DomainError};
use thiserror::Error;

/// Coarse classification of a [`LifecycleError`] for callers that map
/// failures onto responses or retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    InvalidState,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The booking's status does not allow the requested transition.
    #[error("Invalid state transition: cannot move from {current} to {target}")]
    InvalidState {
        current: BookingStatus,
        target: BookingStatus,
    },

    /// The booking does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The caller may not act on the booking.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Another writer committed first. Reload and retry.
    #[error("Version conflict for booking {booking_id}")]
    Conflict { booking_id: BookingId },

    /// A unique field collided on insert.
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// Domain or storage failure.
    #[error("Domain error: {0}")]
    Domain(DomainError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::Validation(_) => ErrorKind::Validation,
            LifecycleError::InvalidState { .. } => ErrorKind::InvalidState,
            LifecycleError::NotFound { .. } => ErrorKind::NotFound,
            LifecycleError::Forbidden(_) => ErrorKind::Forbidden,
            LifecycleError::Conflict { .. } | LifecycleError::Duplicate { .. } => {
                ErrorKind::Conflict
            }
            LifecycleError::Domain(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error is an optimistic concurrency conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LifecycleError::Conflict { .. })
    }
}

impl From<BookingError> for LifecycleError {
    fn from(e: BookingError) -> Self {
        match e {
            BookingError::Validation(message) => LifecycleError::Validation(message),
            BookingError::InvalidStateTransition { current, target } => {
                LifecycleError::InvalidState { current, target }
            }
            BookingError::Pricing(e) => LifecycleError::Validation(format!("pricing error: {e}")),
        }
    }
}

impl From<DomainError> for LifecycleError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Booking(e) => e.into(),
            DomainError::AggregateNotFound {
                aggregate_type,
                aggregate_id,
            } => LifecycleError::NotFound {
                entity: aggregate_type,
                key: aggregate_id,
            },
            DomainError::Conflict { booking_id, .. } => LifecycleError::Conflict { booking_id },
            DomainError::Duplicate { field, value } => LifecycleError::Duplicate { field, value },
            other => LifecycleError::Domain(other),
        }
    }
}

/// Convenience type alias for lifecycle results.
pub type Result<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::Version;

    #[test]
    fn test_domain_errors_classify() {
        let cases = [
            (
                DomainError::Booking(BookingError::Validation("pet name is required".into())),
                ErrorKind::Validation,
            ),
            (
                DomainError::Booking(BookingError::InvalidStateTransition {
                    current: BookingStatus::Completed,
                    target: BookingStatus::Cancelled,
                }),
                ErrorKind::InvalidState,
            ),
            (
                DomainError::AggregateNotFound {
                    aggregate_type: "Booking",
                    aggregate_id: BookingId::new().to_string(),
                },
                ErrorKind::NotFound,
            ),
            (
                DomainError::Conflict {
                    booking_id: BookingId::new(),
                    expected: Version::first(),
                },
                ErrorKind::Conflict,
            ),
            (
                DomainError::Duplicate {
                    field: "booking_number",
                    value: "BK-AAAAAA".into(),
                },
                ErrorKind::Conflict,
            ),
            (
                DomainError::CorruptRecord {
                    booking_id: BookingId::new(),
                    reason: "bad status".into(),
                },
                ErrorKind::Internal,
            ),
        ];

        for (err, kind) in cases {
            let err = LifecycleError::from(err);
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_invalid_state_keeps_statuses() {
        let err = LifecycleError::from(BookingError::InvalidStateTransition {
            current: BookingStatus::Delivered,
            target: BookingStatus::Cancelled,
        });

        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot move from delivered to cancelled"
        );
    }

    #[test]
    fn test_forbidden_kind() {
        let err = LifecycleError::Forbidden("booking does not belong to this user".into());
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(!err.is_conflict());
    }
}
