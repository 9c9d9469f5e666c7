//! Guildhall — Character Management bounded context.
//!
//! Responsible for character sheets owned by guild members: class, combat
//! stats, and the daily/weekly checklist counters players track for
//! themselves.

pub mod application;
pub mod domain;
