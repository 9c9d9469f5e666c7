//! Domain layer for the Donations context.

pub mod aggregates;
pub mod commands;
pub mod events;
