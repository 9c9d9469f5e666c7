//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// An entity rebuilt by folding its own event stream.
///
/// Domain methods validate against current state and record new events
/// without applying them; handlers append the recorded events conditionally
/// on [`AggregateRoot::version`].
pub trait AggregateRoot: Send + Sync {
    /// Events of this stream.
    type Event: DomainEvent;

    /// The stream id.
    fn aggregate_id(&self) -> Uuid;

    /// Number of events folded so far; the expected version of the next append.
    fn version(&self) -> i64;

    /// Folds one committed event into state.
    fn apply(&mut self, event: &Self::Event);

    /// Events recorded since the last load, not yet committed.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Forgets recorded events.
    fn clear_uncommitted_events(&mut self);
}
