//! Route modules organized by bounded context.

pub mod character;
pub mod donation;
pub mod feed;
pub mod health;
pub mod loan;
pub mod market;
pub mod party;
pub mod tournament;

use guildhall_core::repository::StoredEvent;
use serde::Serialize;
use uuid::Uuid;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl From<Vec<StoredEvent>> for CommandResponse {
    fn from(stored_events: Vec<StoredEvent>) -> Self {
        Self {
            event_ids: stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

/// Response body for commands that create an entity.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// The new entity's identifier.
    pub id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl CreatedResponse {
    fn new(id: Uuid, stored_events: &[StoredEvent]) -> Self {
        Self {
            id,
            event_ids: stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}
