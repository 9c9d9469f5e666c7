//! Domain layer for the Tournament Roster context.

pub mod aggregates;
pub mod commands;
pub mod events;
