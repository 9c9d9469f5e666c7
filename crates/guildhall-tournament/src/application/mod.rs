//! Application layer for the Tournament Roster context.

pub mod command_handlers;
pub mod query_handlers;
