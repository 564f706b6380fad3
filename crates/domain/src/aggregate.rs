//! Core aggregate and domain event traits.

use common::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name used on the wire.
    fn event_type(&self) -> &'static str;
}

/// Trait for state-stored aggregates guarded by an optimistic version.
///
/// Command methods validate a transition against the current state, apply it
/// in memory and return the event describing it. They never touch the
/// version: the caller bumps it with [`Aggregate::increment_version`] right
/// before committing, so a rejected command never consumes a version slot.
pub trait Aggregate: Send + Sync + Sized {
    /// The identifier type of this aggregate.
    type Id: Copy + Eq + std::fmt::Display + Send + Sync;

    /// The type of events this aggregate produces.
    type Event: DomainEvent;

    /// The type of errors this aggregate can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> Self::Id;

    /// Returns the current version of the aggregate.
    fn version(&self) -> Version;

    /// Moves the version forward by one ahead of a commit.
    fn increment_version(&mut self);
}
