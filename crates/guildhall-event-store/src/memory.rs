//! In-memory implementation of the `EventRepository` trait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};

#[derive(Debug, Default)]
struct Log {
    events: Vec<StoredEvent>,
    versions: HashMap<Uuid, i64>,
}

/// Process-local event store.
///
/// All streams share one mutex, so a multi-stream write is checked and
/// committed under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    log: Mutex<Log>,
}

impl InMemoryEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Log>, DomainError> {
        self.log
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("event log mutex poisoned: {e}")))
    }
}

fn check_sequence(write: &StreamWrite) -> Result<(), DomainError> {
    for (offset, event) in (1_i64..).zip(&write.events) {
        if event.aggregate_id != write.aggregate_id
            || event.sequence_number != write.expected_version + offset
        {
            return Err(DomainError::Infrastructure(format!(
                "event {} does not continue stream {} at version {}",
                event.event_id, write.aggregate_id, write.expected_version
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let log = self.lock()?;
        Ok(log
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.lock()?.events.clone())
    }

    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError> {
        let mut log = self.lock()?;

        for write in writes {
            let actual = log.versions.get(&write.aggregate_id).copied().unwrap_or(0);
            if actual != write.expected_version {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id: write.aggregate_id,
                    expected: write.expected_version,
                    actual,
                });
            }
            check_sequence(write)?;
        }

        for write in writes {
            #[allow(clippy::cast_possible_wrap)]
            let appended = write.events.len() as i64;
            *log.versions.entry(write.aggregate_id).or_insert(0) += appended;
            log.events.extend(write.events.iter().cloned());
        }
        Ok(())
    }
}
