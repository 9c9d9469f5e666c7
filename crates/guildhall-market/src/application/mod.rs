//! Application layer for the Marketplace context.

pub mod command_handlers;
pub mod query_handlers;
