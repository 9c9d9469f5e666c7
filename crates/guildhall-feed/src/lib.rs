//! Guildhall — activity feed.
//!
//! The feed is never stored. Every read folds the committed event log into a
//! [`NameTable`] and renders the feed-worthy events against it, so a rename
//! shows up on old entries too.

pub mod entry;
pub mod names;
pub mod projector;
pub mod query_handlers;

pub use entry::{FeedEntry, FeedKind};
pub use names::NameTable;
pub use projector::{Projector, project};
