//! Test repositories — mock `EventRepository` implementations for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};
use uuid::Uuid;

/// An event repository seeded with a fixed event log that records every
/// append without applying it.
///
/// `load_events` returns the seeded events of the requested stream, so a
/// handler that reads several streams sees each one separately.
#[derive(Debug)]
pub struct RecordingEventRepository {
    seeded: Vec<StoredEvent>,
    appended: Mutex<Vec<StreamWrite>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that serves `seeded` events.
    #[must_use]
    pub fn new(seeded: Vec<StoredEvent>) -> Self {
        Self {
            seeded,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all stream writes that were appended, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_writes(&self) -> Vec<StreamWrite> {
        self.appended.lock().unwrap().clone()
    }

    /// Returns every appended event, flattened across writes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<StoredEvent> {
        self.appended_writes()
            .into_iter()
            .flat_map(|w| w.events)
            .collect()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .seeded
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.seeded.clone())
    }

    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError> {
        self.appended.lock().unwrap().extend(writes.iter().cloned());
        Ok(())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_streams(&self, _writes: &[StreamWrite]) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_streams(&self, _writes: &[StreamWrite]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// Simulates a competing writer that commits between a handler's read and
/// its conditional write.
///
/// On the first `append_streams` call the competitor's writes are committed
/// to the inner repository first; the handler's own write then hits whatever
/// the inner repository decides (normally a concurrency conflict).
pub struct RacingEventRepository {
    inner: Arc<dyn EventRepository>,
    competitor: Mutex<Option<Vec<StreamWrite>>>,
    append_attempts: Mutex<usize>,
}

impl std::fmt::Debug for RacingEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RacingEventRepository")
            .field("append_attempts", &self.append_attempts)
            .finish_non_exhaustive()
    }
}

impl RacingEventRepository {
    /// Wraps `inner`, committing `competitor` just before the first append.
    #[must_use]
    pub fn new(inner: Arc<dyn EventRepository>, competitor: Vec<StreamWrite>) -> Self {
        Self {
            inner,
            competitor: Mutex::new(Some(competitor)),
            append_attempts: Mutex::new(0),
        }
    }

    /// Number of `append_streams` calls made by the code under test.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn append_attempts(&self) -> usize {
        *self.append_attempts.lock().unwrap()
    }
}

#[async_trait]
impl EventRepository for RacingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_all_events().await
    }

    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError> {
        *self.append_attempts.lock().unwrap() += 1;
        let competitor = self.competitor.lock().unwrap().take();
        if let Some(competitor) = competitor {
            self.inner.append_streams(&competitor).await?;
        }
        self.inner.append_streams(writes).await
    }
}
