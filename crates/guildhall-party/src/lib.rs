//! Guildhall — Party Membership bounded context.
//!
//! Parties are scoped to a nest (dungeon instance). A character may sit in at
//! most one party per nest and a party never exceeds its member cap. Each
//! nest has a roster stream recording which party holds which character;
//! joins and leaves commit to the party stream and the roster stream in one
//! conditional write.

pub mod application;
pub mod domain;
