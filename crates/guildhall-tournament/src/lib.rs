//! Guildhall — Tournament Roster bounded context.
//!
//! Guild leaders run tournaments with a participant cap. Members sign up one
//! character each while the tournament is pending; the leader then starts
//! and completes it.

pub mod application;
pub mod domain;
