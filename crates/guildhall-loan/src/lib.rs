//! Guildhall — Loan bounded context.
//!
//! Members borrow gold from the guild bank or from a registered merchant. A
//! loan moves through a fixed lifecycle; each step is taken by either the
//! lending side or the borrowing side and is checked against one central
//! transition table.

pub mod application;
pub mod domain;
