//! Push notification of committed events.
//!
//! `PublishingEventRepository` decorates another repository and broadcasts
//! every event it successfully commits. Subscribers get a
//! `broadcast::Receiver`; dropping it unsubscribes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};

/// Default number of events buffered per subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Repository decorator that publishes committed events.
pub struct PublishingEventRepository {
    inner: Arc<dyn EventRepository>,
    sender: broadcast::Sender<StoredEvent>,
}

impl std::fmt::Debug for PublishingEventRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishingEventRepository")
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl PublishingEventRepository {
    /// Wraps `inner`, buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(inner: Arc<dyn EventRepository>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { inner, sender }
    }

    /// Subscribes to events committed after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoredEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventRepository for PublishingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_all_events().await
    }

    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError> {
        self.inner.append_streams(writes).await?;
        for event in writes.iter().flat_map(|w| &w.events) {
            // No receivers is not an error; nobody is listening yet.
            if self.sender.send(event.clone()).is_err() {
                debug!(event_id = %event.event_id, "no feed subscribers");
            }
        }
        Ok(())
    }
}
