//! Membership rules spanning a party and its nest roster.
//!
//! Every rule here reads both aggregates and, on success, records matching
//! events on both so the caller can commit them in one conditional write.

use guildhall_character::domain::aggregates::Character;
use guildhall_core::actor::Actor;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use uuid::Uuid;

use super::aggregates::{MAX_PARTY_SIZE, NestRoster, Party};

/// Conflict code: the party has no free seat.
pub const PARTY_FULL: &str = "party_full";
/// Conflict code: the character already sits in a party of this nest.
pub const ALREADY_IN_NEST: &str = "already_in_nest";
/// Conflict code: the user already holds a seat in this party.
pub const ALREADY_MEMBER: &str = "already_member";
/// Conflict code: the party id is taken.
pub const PARTY_EXISTS: &str = "party_exists";
/// Conflict code: the character holds no seat in this party.
pub const NOT_A_MEMBER: &str = "not_a_member";

/// Forms `party` in `roster`'s nest.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty nest or a member cap outside
/// `1..=32`, and `DomainError::Conflict` (`party_exists`) if the id is taken.
pub fn create(
    party: &mut Party,
    roster: &mut NestRoster,
    actor: &Actor,
    max_member: u32,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<(), DomainError> {
    if roster.nest.is_empty() {
        return Err(DomainError::Validation("nest must not be empty".into()));
    }
    if !(1..=MAX_PARTY_SIZE).contains(&max_member) {
        return Err(DomainError::Validation(format!(
            "max_member must be between 1 and {MAX_PARTY_SIZE}, got {max_member}"
        )));
    }
    if party.exists() {
        return Err(DomainError::conflict(
            PARTY_EXISTS,
            format!("party {} already exists", party.id),
        ));
    }

    party.record_created(
        roster.nest.clone(),
        max_member,
        actor.user_id.clone(),
        correlation_id,
        clock,
    );
    roster.record_party_registered(party.id, correlation_id, clock);
    Ok(())
}

/// Seats `character` in `party`.
///
/// Checks run in order: the actor may use the character, the party exists,
/// the user is not seated in this party yet, the character is not seated
/// elsewhere in the nest, and a seat is free.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound`, `DomainError::Unauthorized`, or
/// `DomainError::Conflict` with one of `character_archived`,
/// `already_member`, `already_in_nest` or `party_full`.
pub fn join(
    party: &mut Party,
    roster: &mut NestRoster,
    character: &Character,
    actor: &Actor,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<(), DomainError> {
    character.ensure_usable_by(actor)?;
    if !party.exists() {
        return Err(DomainError::AggregateNotFound(party.id));
    }
    if party.has_user(&actor.user_id) {
        return Err(DomainError::conflict(
            ALREADY_MEMBER,
            format!("user {} is already in party {}", actor.user_id, party.id),
        ));
    }
    if let Some(holder) = roster.placement_of(character.id) {
        return Err(DomainError::conflict(
            ALREADY_IN_NEST,
            format!(
                "character {} is already in party {holder} for {}",
                character.id, roster.nest
            ),
        ));
    }
    if party.is_full() {
        return Err(DomainError::conflict(
            PARTY_FULL,
            format!(
                "party {} has {} of {} members",
                party.id,
                party.members.len(),
                party.max_member
            ),
        ));
    }

    party.record_joined(character.id, actor.user_id.clone(), correlation_id, clock);
    roster.record_placed(character.id, party.id, correlation_id, clock);
    Ok(())
}

/// Releases `character_id`'s seat in `party`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the party does not exist,
/// `DomainError::Conflict` (`not_a_member`) if the character holds no seat,
/// and `DomainError::Unauthorized` if the actor is not the seat holder.
pub fn leave(
    party: &mut Party,
    roster: &mut NestRoster,
    character_id: Uuid,
    actor: &Actor,
    correlation_id: Uuid,
    clock: &dyn Clock,
) -> Result<(), DomainError> {
    if !party.exists() {
        return Err(DomainError::AggregateNotFound(party.id));
    }
    let Some(seat) = party.members.get(&character_id) else {
        return Err(DomainError::conflict(
            NOT_A_MEMBER,
            format!("character {character_id} is not in party {}", party.id),
        ));
    };
    if !actor.is(&seat.user_id) {
        return Err(DomainError::Unauthorized(format!(
            "only the seat holder may leave party {}",
            party.id
        )));
    }

    let user_id = seat.user_id.clone();
    party.record_left(character_id, user_id, correlation_id, clock);
    roster.record_released(character_id, party.id, correlation_id, clock);
    Ok(())
}
