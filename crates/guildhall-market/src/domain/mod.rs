//! Domain layer for the Marketplace context.

pub mod aggregates;
pub mod commands;
pub mod events;
