//! Domain layer for the Party Membership context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod membership;
