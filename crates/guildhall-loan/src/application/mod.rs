//! Application layer for the Loan context.

pub mod command_handlers;
pub mod query_handlers;
