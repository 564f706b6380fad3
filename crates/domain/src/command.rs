//! Command infrastructure.

use common::Version;

use crate::aggregate::Aggregate;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate as committed.
    pub aggregate: A,

    /// The event describing the committed transition.
    pub event: A::Event,

    /// The version the aggregate was committed at.
    pub new_version: Version,
}

/// Trait for commands that target an existing aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> <Self::Aggregate as Aggregate>::Id;

    /// Applies the transition to the loaded aggregate.
    ///
    /// Must not touch the version.
    fn apply(
        &self,
        aggregate: &mut Self::Aggregate,
    ) -> Result<<Self::Aggregate as Aggregate>::Event, <Self::Aggregate as Aggregate>::Error>;
}
