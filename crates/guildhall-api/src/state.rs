//! Shared application state.

use std::collections::HashSet;
use std::sync::Arc;

use guildhall_core::clock::SharedClock;
use guildhall_core::repository::EventRepository;
use guildhall_core::retry::RetryPolicy;
use guildhall_event_store::PublishingEventRepository;
use guildhall_event_store::publishing::DEFAULT_CHANNEL_CAPACITY;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source for event timestamps.
    pub clock: SharedClock,
    /// The store every handler reads and writes. Commits are published to
    /// feed subscribers.
    pub event_repository: Arc<dyn EventRepository>,
    /// The same store, kept concretely for subscriptions.
    pub publisher: Arc<PublishingEventRepository>,
    /// Discord ids that act for the guild.
    pub guild_leaders: Arc<HashSet<String>>,
    /// Conflict retry policy applied to contended commands.
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("publisher", &self.publisher)
            .field("guild_leaders", &self.guild_leaders)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state over `store`.
    #[must_use]
    pub fn new(
        clock: SharedClock,
        store: Arc<dyn EventRepository>,
        guild_leaders: HashSet<String>,
        retry: RetryPolicy,
    ) -> Self {
        let publisher = Arc::new(PublishingEventRepository::new(
            store,
            DEFAULT_CHANNEL_CAPACITY,
        ));
        Self {
            clock,
            event_repository: publisher.clone(),
            publisher,
            guild_leaders: Arc::new(guild_leaders),
            retry,
        }
    }

    /// Whether `user_id` is configured as a guild leader.
    #[must_use]
    pub fn is_guild_leader(&self, user_id: &str) -> bool {
        self.guild_leaders.contains(user_id)
    }
}
