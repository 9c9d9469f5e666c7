//! Feed queries.

use guildhall_core::error::DomainError;
use guildhall_core::repository::EventRepository;
use tracing::debug;

use crate::entry::{FeedEntry, FeedKind};
use crate::projector::project;

/// Default page size for feed reads.
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// Returns up to `limit` newest feed entries, optionally of one kind.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or decoding fails.
pub async fn get_feed(
    limit: usize,
    kind: Option<FeedKind>,
    repo: &dyn EventRepository,
) -> Result<Vec<FeedEntry>, DomainError> {
    let all_events = repo.load_all_events().await?;
    let entries: Vec<FeedEntry> = project(&all_events)?
        .into_iter()
        .filter(|entry| kind.is_none_or(|wanted| entry.kind == wanted))
        .take(limit)
        .collect();
    debug!(events = all_events.len(), entries = entries.len(), "feed projected");
    Ok(entries)
}
