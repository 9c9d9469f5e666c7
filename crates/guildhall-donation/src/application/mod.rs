//! Application layer for the Donations context.

pub mod command_handlers;
pub mod query_handlers;
