//! Domain layer for the Character Management context.

pub mod aggregates;
pub mod commands;
pub mod events;
