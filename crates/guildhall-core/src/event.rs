//! Domain event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::repository::StoredEvent;

/// Envelope fields shared by every event, whatever its stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Globally unique; also the feed entry id.
    pub event_id: Uuid,
    /// Dotted name such as `party.member_joined`.
    pub event_type: String,
    /// The stream.
    pub aggregate_id: Uuid,
    /// 1-based position within the stream.
    pub sequence_number: i64,
    /// Shared by every event one command produced.
    pub correlation_id: Uuid,
    /// The command or event that caused this one.
    pub causation_id: Uuid,
    /// When the command was decided.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Rebuilds metadata from a stored event.
    #[must_use]
    pub fn from_stored(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            aggregate_id: stored.aggregate_id,
            sequence_number: stored.sequence_number,
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        }
    }
}

/// An event of one bounded context.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// The dotted event name stored alongside the payload.
    fn event_type(&self) -> &'static str;

    /// The JSON payload.
    fn to_payload(&self) -> serde_json::Value;

    fn metadata(&self) -> &EventMetadata;

    /// Flattens the event into a store row.
    fn to_stored(&self) -> StoredEvent {
        let meta = self.metadata();
        StoredEvent {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            sequence_number: meta.sequence_number,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

/// Decodes the payload of a stored event into a context's event kind.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if deserialization fails.
pub fn decode_payload<K>(stored: &StoredEvent) -> Result<K, DomainError>
where
    K: serde::de::DeserializeOwned,
{
    serde_json::from_value(stored.payload.clone())
        .map_err(|e| DomainError::Infrastructure(format!("event deserialization failed: {e}")))
}
