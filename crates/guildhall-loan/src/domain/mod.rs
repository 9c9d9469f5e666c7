//! Domain layer for the Loan context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod lifecycle;
