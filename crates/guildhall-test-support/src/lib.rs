//! Shared test mocks and utilities for the Guildhall guild backend.

mod clock;
mod repository;

pub use clock::{FixedClock, SteppingClock, fixed_now};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, RacingEventRepository, RecordingEventRepository,
};
