//! Application layer for the Party Membership context.

pub mod command_handlers;
pub mod query_handlers;
