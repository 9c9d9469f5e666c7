//! Command handlers for the Tournament Roster context.
//!
//! Sign-ups race each other for the last slots, so joins and status steps
//! run under [`retry_on_conflict`] and re-check the roster on every attempt.

use guildhall_character::application::command_handlers::load_character;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};
use guildhall_core::retry::{RetryPolicy, retry_on_conflict};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::Tournament;
use crate::domain::commands::{
    CompleteTournament, CreateTournament, JoinTournament, StartTournament,
};
use crate::domain::events::{TournamentEvent, TournamentEventKind};

/// Reconstitutes a `Tournament` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    tournament_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Tournament, DomainError> {
    let mut tournament = Tournament::new(tournament_id);
    for stored in existing_events {
        let kind: TournamentEventKind = decode_payload(stored)?;
        tournament.apply(&TournamentEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(tournament)
}

/// Loads and reconstitutes an existing tournament.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the tournament has no events.
pub async fn load_tournament(
    tournament_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Tournament, DomainError> {
    let existing_events = repo.load_events(tournament_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(tournament_id));
    }
    reconstitute(tournament_id, &existing_events)
}

async fn persist(
    tournament: &Tournament,
    guard: Option<StreamWrite>,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = tournament
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();

    let mut writes = vec![StreamWrite::new(
        tournament.id,
        tournament.version(),
        stored_events.clone(),
    )];
    writes.extend(guard);
    repo.append_streams(&writes).await?;
    debug!(tournament_id = %tournament.id, count = stored_events.len(), "tournament events persisted");

    Ok(stored_events)
}

/// Handles the `CreateTournament` command.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` for non-leaders and
/// `DomainError::Validation` for a bad name or cap.
pub async fn handle_create_tournament(
    command: &CreateTournament,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let existing_events = repo.load_events(command.tournament_id).await?;
    let mut tournament = reconstitute(command.tournament_id, &existing_events)?;
    tournament.create(
        &command.actor,
        command.name.trim().to_owned(),
        command.max_participants,
        command.correlation_id,
        clock,
    )?;

    persist(&tournament, None, repo).await
}

/// Handles the `JoinTournament` command.
///
/// # Errors
///
/// Returns `DomainError::Conflict` with `tournament_not_pending`,
/// `already_registered` or `tournament_full`, the character ownership
/// errors, and `DomainError` if loading or appending fails.
pub async fn handle_join_tournament(
    command: &JoinTournament,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || async move {
        let character = load_character(command.character_id, repo).await?;
        let mut tournament = load_tournament(command.tournament_id, repo).await?;
        tournament.join(&command.actor, &character, command.correlation_id, clock)?;
        let guard = StreamWrite::guard(character.id, character.version());
        persist(&tournament, Some(guard), repo).await
    })
    .await
}

/// Handles the `StartTournament` command.
///
/// # Errors
///
/// Returns `DomainError::Conflict` (`invalid_transition`) unless pending.
pub async fn handle_start_tournament(
    command: &StartTournament,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || async move {
        let mut tournament = load_tournament(command.tournament_id, repo).await?;
        tournament.start(&command.actor, command.correlation_id, clock)?;
        persist(&tournament, None, repo).await
    })
    .await
}

/// Handles the `CompleteTournament` command.
///
/// # Errors
///
/// Returns `DomainError::Conflict` (`invalid_transition`) unless active.
pub async fn handle_complete_tournament(
    command: &CompleteTournament,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || async move {
        let mut tournament = load_tournament(command.tournament_id, repo).await?;
        tournament.complete(&command.actor, command.correlation_id, clock)?;
        persist(&tournament, None, repo).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guildhall_character::application::command_handlers::handle_create_character;
    use guildhall_character::domain::commands::CreateCharacter;
    use guildhall_character::domain::events::Stats;
    use guildhall_core::actor::Actor;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_test_support::{FixedClock, RacingEventRepository, fixed_now};

    use super::*;
    use crate::domain::aggregates::{ALREADY_REGISTERED, TOURNAMENT_FULL};
    use crate::domain::events::TournamentStatus;

    async fn new_character(repo: &dyn EventRepository, actor: &Actor) -> Uuid {
        let character_id = Uuid::new_v4();
        let command = CreateCharacter {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            character_id,
            name: format!("{} main", actor.display_name),
            class: "Moonlord".into(),
            main_class: "Sorceress".into(),
            stats: Stats::default(),
        };
        handle_create_character(&command, &FixedClock(fixed_now()), repo)
            .await
            .unwrap();
        character_id
    }

    async fn new_tournament(repo: &dyn EventRepository, max_participants: u32) -> Uuid {
        let tournament_id = Uuid::new_v4();
        let command = CreateTournament {
            correlation_id: Uuid::new_v4(),
            actor: Actor::guild_leader("9000", "boss"),
            tournament_id,
            name: "Spring Cup".into(),
            max_participants,
        };
        handle_create_tournament(&command, &FixedClock(fixed_now()), repo)
            .await
            .unwrap();
        tournament_id
    }

    async fn join(
        repo: &dyn EventRepository,
        tournament_id: Uuid,
        actor: &Actor,
        character_id: Uuid,
    ) -> Result<Vec<StoredEvent>, DomainError> {
        let command = JoinTournament {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            tournament_id,
            character_id,
        };
        handle_join_tournament(&command, &FixedClock(fixed_now()), repo, RetryPolicy::default())
            .await
    }

    #[tokio::test]
    async fn test_two_slot_tournament_rejects_third_and_duplicate() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let tournament_id = new_tournament(&repo, 2).await;
        let first = Actor::member("1001", "aster");
        let second = Actor::member("1002", "bryn");
        let third = Actor::member("1003", "cato");
        let first_character = new_character(&repo, &first).await;
        let second_character = new_character(&repo, &second).await;
        let third_character = new_character(&repo, &third).await;
        join(&repo, tournament_id, &first, first_character).await.unwrap();
        join(&repo, tournament_id, &second, second_character).await.unwrap();

        // Act
        let third_result = join(&repo, tournament_id, &third, third_character).await;
        let duplicate = join(&repo, tournament_id, &first, first_character).await;

        // Assert
        assert_eq!(third_result.unwrap_err().conflict_code(), Some(TOURNAMENT_FULL));
        assert_eq!(duplicate.unwrap_err().conflict_code(), Some(ALREADY_REGISTERED));
        let tournament = load_tournament(tournament_id, &repo).await.unwrap();
        assert_eq!(tournament.participants().len(), 2);
        assert!(tournament.participants().contains_key("1001"));
        assert!(tournament.participants().contains_key("1002"));
    }

    #[tokio::test]
    async fn test_join_for_last_slot_loses_race_and_sees_full() {
        // Arrange
        let inner = Arc::new(InMemoryEventRepository::new());
        let tournament_id = new_tournament(inner.as_ref(), 2).await;
        let first = Actor::member("1001", "aster");
        let first_character = new_character(inner.as_ref(), &first).await;
        join(inner.as_ref(), tournament_id, &first, first_character)
            .await
            .unwrap();
        let rival = Actor::member("2002", "rival");
        let rival_character = new_character(inner.as_ref(), &rival).await;
        let rival_write = {
            let character = load_character(rival_character, inner.as_ref()).await.unwrap();
            let mut tournament = load_tournament(tournament_id, inner.as_ref()).await.unwrap();
            tournament
                .join(&rival, &character, Uuid::new_v4(), &FixedClock(fixed_now()))
                .unwrap();
            vec![StreamWrite::new(
                tournament.id,
                tournament.version(),
                tournament.uncommitted_events().iter().map(DomainEvent::to_stored).collect(),
            )]
        };
        let me = Actor::member("3003", "me");
        let my_character = new_character(inner.as_ref(), &me).await;
        let repo = RacingEventRepository::new(inner.clone(), rival_write);

        // Act
        let result = join(&repo, tournament_id, &me, my_character).await;

        // Assert
        assert_eq!(result.unwrap_err().conflict_code(), Some(TOURNAMENT_FULL));
        let tournament = load_tournament(tournament_id, inner.as_ref()).await.unwrap();
        assert_eq!(tournament.participants().len(), 2);
        assert!(tournament.participants().contains_key("2002"));
    }

    #[tokio::test]
    async fn test_join_rechecks_character_archived_mid_join() {
        // Arrange
        let inner = Arc::new(InMemoryEventRepository::new());
        let tournament_id = new_tournament(inner.as_ref(), 4).await;
        let me = Actor::member("3003", "me");
        let my_character = new_character(inner.as_ref(), &me).await;
        let archive_write = {
            let mut character = load_character(my_character, inner.as_ref()).await.unwrap();
            character
                .archive(&me, Uuid::new_v4(), &FixedClock(fixed_now()))
                .unwrap();
            vec![StreamWrite::new(
                character.id,
                character.version(),
                character.uncommitted_events().iter().map(DomainEvent::to_stored).collect(),
            )]
        };
        let repo = RacingEventRepository::new(inner.clone(), archive_write);

        // Act
        let result = join(&repo, tournament_id, &me, my_character).await;

        // Assert
        assert_eq!(result.unwrap_err().conflict_code(), Some("character_archived"));
        assert_eq!(repo.append_attempts(), 1);
        let tournament = load_tournament(tournament_id, inner.as_ref()).await.unwrap();
        assert!(tournament.participants().is_empty());
    }

    #[tokio::test]
    async fn test_start_then_complete() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let leader = Actor::guild_leader("9000", "boss");
        let tournament_id = new_tournament(&repo, 4).await;

        handle_start_tournament(
            &StartTournament {
                correlation_id: Uuid::new_v4(),
                actor: leader.clone(),
                tournament_id,
            },
            &clock,
            &repo,
            RetryPolicy::default(),
        )
        .await
        .unwrap();
        handle_complete_tournament(
            &CompleteTournament {
                correlation_id: Uuid::new_v4(),
                actor: leader,
                tournament_id,
            },
            &clock,
            &repo,
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        let tournament = load_tournament(tournament_id, &repo).await.unwrap();
        assert_eq!(tournament.status(), TournamentStatus::Completed);
    }
}
