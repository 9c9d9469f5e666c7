//! Guildhall event stores.
//!
//! `InMemoryEventRepository` backs development runs and tests,
//! `PgEventRepository` backs production, and `PublishingEventRepository`
//! wraps either to push committed events to subscribers.

pub mod memory;
pub mod pg_event_repository;
pub mod publishing;

pub use memory::InMemoryEventRepository;
pub use pg_event_repository::PgEventRepository;
pub use publishing::PublishingEventRepository;
