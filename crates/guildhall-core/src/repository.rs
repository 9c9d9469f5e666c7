//! Event repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// A conditional append to one aggregate stream.
///
/// The write applies only if the stream's current version equals
/// `expected_version`.
#[derive(Debug, Clone)]
pub struct StreamWrite {
    /// The stream being appended to.
    pub aggregate_id: Uuid,
    /// The last sequence number the writer observed.
    pub expected_version: i64,
    /// Events to append, with consecutive sequence numbers.
    pub events: Vec<StoredEvent>,
}

impl StreamWrite {
    /// Creates a new stream write.
    #[must_use]
    pub fn new(aggregate_id: Uuid, expected_version: i64, events: Vec<StoredEvent>) -> Self {
        Self {
            aggregate_id,
            expected_version,
            events,
        }
    }

    /// A write that appends nothing but still requires `aggregate_id` to be
    /// at `expected_version` when the other writes commit.
    #[must_use]
    pub fn guard(aggregate_id: Uuid, expected_version: i64) -> Self {
        Self::new(aggregate_id, expected_version, Vec::new())
    }
}

/// Repository trait for loading and appending domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Load every event in the store, in insertion order.
    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append to several streams as one atomic conditional write.
    ///
    /// Either every write's expected version matches and all events are
    /// committed, or nothing is committed and
    /// `DomainError::ConcurrencyConflict` is returned.
    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last known sequence number.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.append_streams(&[StreamWrite::new(
            aggregate_id,
            expected_version,
            events.to_vec(),
        )])
        .await
    }
}

/// Groups events whose type starts with `type_prefix` by stream, ordered by
/// each stream's first appearance in `events`.
///
/// Used by list queries that fold every aggregate of one kind out of the full
/// log.
#[must_use]
pub fn streams_with_prefix(events: &[StoredEvent], type_prefix: &str) -> Vec<(Uuid, Vec<StoredEvent>)> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut streams: std::collections::HashMap<Uuid, Vec<StoredEvent>> =
        std::collections::HashMap::new();
    for event in events.iter().filter(|e| e.event_type.starts_with(type_prefix)) {
        streams
            .entry(event.aggregate_id)
            .or_insert_with(|| {
                order.push(event.aggregate_id);
                Vec::new()
            })
            .push(event.clone());
    }
    order
        .into_iter()
        .filter_map(|id| streams.remove(&id).map(|events| (id, events)))
        .collect()
}
