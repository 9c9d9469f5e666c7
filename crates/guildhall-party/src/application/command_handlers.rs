//! Command handlers for the Party Membership context.
//!
//! Every handler loads the party stream and its nest roster stream, applies a
//! membership rule, and commits both streams in one conditional write. A lost
//! race surfaces as `DomainError::ConcurrencyConflict`, which reruns the whole
//! attempt against fresh state.

use guildhall_character::application::command_handlers::load_character;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};
use guildhall_core::retry::{RetryPolicy, retry_on_conflict};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::{NestRoster, Party};
use crate::domain::commands::{CreateParty, JoinParty, LeaveParty};
use crate::domain::events::{NestRosterEvent, NestRosterEventKind, PartyEvent, PartyEventKind};
use crate::domain::membership;

/// Reconstitutes a `Party` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(party_id: Uuid, existing_events: &[StoredEvent]) -> Result<Party, DomainError> {
    let mut party = Party::new(party_id);
    for stored in existing_events {
        let kind: PartyEventKind = decode_payload(stored)?;
        party.apply(&PartyEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(party)
}

/// Reconstitutes the roster of `nest` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute_roster(
    nest: &str,
    existing_events: &[StoredEvent],
) -> Result<NestRoster, DomainError> {
    let mut roster = NestRoster::new(nest);
    for stored in existing_events {
        let kind: NestRosterEventKind = decode_payload(stored)?;
        roster.apply(&NestRosterEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(roster)
}

/// Loads and reconstitutes an existing party.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the party has no events.
pub async fn load_party(party_id: Uuid, repo: &dyn EventRepository) -> Result<Party, DomainError> {
    let existing_events = repo.load_events(party_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(party_id));
    }
    reconstitute(party_id, &existing_events)
}

/// Loads the roster of `nest`; a nest nobody has used yet has an empty roster.
///
/// # Errors
///
/// Returns `DomainError` if loading or deserialization fails.
pub async fn load_roster(nest: &str, repo: &dyn EventRepository) -> Result<NestRoster, DomainError> {
    let roster = NestRoster::new(nest);
    let existing_events = repo.load_events(roster.id).await?;
    reconstitute_roster(nest, &existing_events)
}

async fn persist_pair(
    party: &Party,
    roster: &NestRoster,
    guard: Option<StreamWrite>,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let party_events: Vec<StoredEvent> = party
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    let roster_events: Vec<StoredEvent> = roster
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();

    let mut writes = vec![
        StreamWrite::new(party.id, party.version(), party_events),
        StreamWrite::new(roster.id, roster.version(), roster_events),
    ];
    writes.extend(guard);
    repo.append_streams(&writes).await?;
    debug!(party_id = %party.id, nest = %roster.nest, "party and roster events persisted");

    Ok(writes.into_iter().flat_map(|w| w.events).collect())
}

async fn create_once(
    command: &CreateParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let existing_events = repo.load_events(command.party_id).await?;
    let mut party = reconstitute(command.party_id, &existing_events)?;
    let mut roster = load_roster(&command.nest, repo).await?;
    membership::create(
        &mut party,
        &mut roster,
        &command.actor,
        command.max_member,
        command.correlation_id,
        clock,
    )?;

    persist_pair(&party, &roster, None, repo).await
}

/// Handles the `CreateParty` command: forms the party and registers it on the
/// nest roster.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank nest or bad member cap, and
/// `DomainError` if loading or appending fails.
pub async fn handle_create_party(
    command: &CreateParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || create_once(command, clock, repo)).await
}

async fn join_once(
    command: &JoinParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let character = load_character(command.character_id, repo).await?;
    let mut party = load_party(command.party_id, repo).await?;
    let mut roster = load_roster(party.nest(), repo).await?;
    membership::join(
        &mut party,
        &mut roster,
        &character,
        &command.actor,
        command.correlation_id,
        clock,
    )?;

    // The seat is only valid while the character is unchanged since the check.
    let guard = StreamWrite::guard(character.id, character.version());
    persist_pair(&party, &roster, Some(guard), repo).await
}

/// Handles the `JoinParty` command.
///
/// # Errors
///
/// Returns `DomainError::Conflict` with `party_full`, `already_in_nest` or
/// `already_member` when the seat cannot be granted, and
/// `DomainError::ConcurrencyConflict` if every retry lost a race.
pub async fn handle_join_party(
    command: &JoinParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || join_once(command, clock, repo)).await
}

async fn leave_once(
    command: &LeaveParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut party = load_party(command.party_id, repo).await?;
    let mut roster = load_roster(party.nest(), repo).await?;
    membership::leave(
        &mut party,
        &mut roster,
        command.character_id,
        &command.actor,
        command.correlation_id,
        clock,
    )?;

    persist_pair(&party, &roster, None, repo).await
}

/// Handles the `LeaveParty` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, authorization, or appending fails.
pub async fn handle_leave_party(
    command: &LeaveParty,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || leave_once(command, clock, repo)).await
}
