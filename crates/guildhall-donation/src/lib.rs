//! Guildhall — Donations bounded context.
//!
//! Members pledge gold or items to the guild; a guild leader approves or
//! rejects each pledge once.

pub mod application;
pub mod domain;
