//! Guildhall — Marketplace bounded context.
//!
//! Guild members who sell gold register a merchant record keyed by their
//! Discord id. Merchants advertise a price per hundred gold, record sales,
//! and list items for the guild feed.

pub mod application;
pub mod domain;
