//! Command handlers for the Character Management context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::Character;
use crate::domain::commands::{
    ArchiveCharacter, CreateCharacter, RecordChecklist, ResetChecklist, UpdateProfile, UpdateStats,
};
use crate::domain::events::{CharacterEvent, CharacterEventKind};

/// Reconstitutes a `Character` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    character_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Character, DomainError> {
    let mut character = Character::new(character_id);
    for stored in existing_events {
        let kind: CharacterEventKind = decode_payload(stored)?;
        character.apply(&CharacterEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(character)
}

/// Loads and reconstitutes an existing character.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the character has no events.
pub async fn load_character(
    character_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Character, DomainError> {
    let existing_events = repo.load_events(character_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(character_id));
    }
    reconstitute(character_id, &existing_events)
}

async fn persist(
    character: &Character,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = character
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();

    repo.append_events(character.id, character.version(), &stored_events)
        .await?;
    debug!(character_id = %character.id, count = stored_events.len(), "character events persisted");

    Ok(stored_events)
}

fn require_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation(
            "character name must not be empty".into(),
        ));
    }
    Ok(())
}

/// Handles the `CreateCharacter` command: creates a fresh aggregate, applies
/// the create domain method, and persists the resulting events.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty name and `DomainError` if
/// event appending fails.
pub async fn handle_create_character(
    command: &CreateCharacter,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    require_name(&command.name)?;

    let mut character = Character::new(command.character_id);
    character.create(
        &command.actor,
        command.name.trim().to_owned(),
        command.class.clone(),
        command.main_class.clone(),
        command.stats,
        command.correlation_id,
        clock,
    )?;

    persist(&character, repo).await
}

/// Handles the `UpdateProfile` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, authorization, or appending fails.
pub async fn handle_update_profile(
    command: &UpdateProfile,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    require_name(&command.name)?;

    let mut character = load_character(command.character_id, repo).await?;
    character.update_profile(
        &command.actor,
        command.name.trim().to_owned(),
        command.class.clone(),
        command.main_class.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&character, repo).await
}

/// Handles the `UpdateStats` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, authorization, or appending fails.
pub async fn handle_update_stats(
    command: &UpdateStats,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut character = load_character(command.character_id, repo).await?;
    character.update_stats(&command.actor, command.stats, command.correlation_id, clock)?;

    persist(&character, repo).await
}

/// Handles the `RecordChecklist` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, validation, authorization, or appending
/// fails.
pub async fn handle_record_checklist(
    command: &RecordChecklist,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut character = load_character(command.character_id, repo).await?;
    character.record_checklist(
        &command.actor,
        command.period,
        command.task.clone(),
        command.count,
        command.correlation_id,
        clock,
    )?;

    persist(&character, repo).await
}

/// Handles the `ResetChecklist` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, authorization, or appending fails.
pub async fn handle_reset_checklist(
    command: &ResetChecklist,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut character = load_character(command.character_id, repo).await?;
    character.reset_checklist(&command.actor, command.period, command.correlation_id, clock)?;

    persist(&character, repo).await
}

/// Handles the `ArchiveCharacter` command.
///
/// # Errors
///
/// Returns `DomainError` if loading, authorization, or appending fails.
pub async fn handle_archive_character(
    command: &ArchiveCharacter,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut character = load_character(command.character_id, repo).await?;
    character.archive(&command.actor, command.correlation_id, clock)?;

    persist(&character, repo).await
}

#[cfg(test)]
mod tests {
    use guildhall_core::actor::Actor;
    use guildhall_core::error::DomainError;
    use guildhall_core::repository::{EventRepository, StoredEvent};
    use guildhall_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, RecordingEventRepository,
        fixed_now,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::events::{
        CHARACTER_CREATED_EVENT_TYPE, CharacterCreated, ChecklistPeriod, STATS_UPDATED_EVENT_TYPE,
        Stats,
    };

    fn created_event(character_id: Uuid, owner_id: &str) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: character_id,
            event_type: CHARACTER_CREATED_EVENT_TYPE.to_owned(),
            payload: serde_json::to_value(CharacterEventKind::CharacterCreated(CharacterCreated {
                character_id,
                owner_id: owner_id.to_owned(),
                name: "Aster".to_owned(),
                class: "Gladiator".to_owned(),
                main_class: "Warrior".to_owned(),
                stats: Stats::default(),
            }))
            .unwrap(),
            sequence_number: 1,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn test_handle_create_character_persists_created_event() {
        // Arrange
        let character_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let repo = RecordingEventRepository::new(Vec::new());
        let command = CreateCharacter {
            correlation_id,
            actor: Actor::member("1001", "aster"),
            character_id,
            name: "  Aster ".into(),
            class: "Gladiator".into(),
            main_class: "Warrior".into(),
            stats: Stats::default(),
        };

        // Act
        let stored = handle_create_character(&command, &clock, &repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(stored.len(), 1);
        let writes = repo.appended_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].aggregate_id, character_id);
        assert_eq!(writes[0].expected_version, 0);
        assert_eq!(writes[0].events[0].event_type, CHARACTER_CREATED_EVENT_TYPE);
        assert_eq!(writes[0].events[0].correlation_id, correlation_id);

        let payload: CharacterEventKind =
            serde_json::from_value(writes[0].events[0].payload.clone()).unwrap();
        match payload {
            CharacterEventKind::CharacterCreated(created) => {
                assert_eq!(created.name, "Aster");
                assert_eq!(created.owner_id, "1001");
            }
            other => panic!("expected CharacterCreated payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_create_character_rejects_blank_name() {
        let clock = FixedClock(fixed_now());
        let command = CreateCharacter {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            character_id: Uuid::new_v4(),
            name: "   ".into(),
            class: "Gladiator".into(),
            main_class: "Warrior".into(),
            stats: Stats::default(),
        };

        let result = handle_create_character(&command, &clock, &EmptyEventRepository).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_handle_update_stats_appends_at_loaded_version() {
        // Arrange
        let character_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let repo = RecordingEventRepository::new(vec![created_event(character_id, "1001")]);
        let command = UpdateStats {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            character_id,
            stats: Stats {
                hp: 9_000_000,
                ..Stats::default()
            },
        };

        // Act
        handle_update_stats(&command, &clock, &repo).await.unwrap();

        // Assert
        let writes = repo.appended_writes();
        assert_eq!(writes[0].expected_version, 1);
        assert_eq!(writes[0].events[0].sequence_number, 2);
        assert_eq!(writes[0].events[0].event_type, STATS_UPDATED_EVENT_TYPE);
    }

    #[tokio::test]
    async fn test_handle_record_checklist_by_other_user_is_unauthorized() {
        let character_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let repo = RecordingEventRepository::new(vec![created_event(character_id, "1001")]);
        let command = RecordChecklist {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("2002", "mallory"),
            character_id,
            period: ChecklistPeriod::Daily,
            task: "Dailies".into(),
            count: 1,
        };

        let result = handle_record_checklist(&command, &clock, &repo).await;

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
        assert!(repo.appended_writes().is_empty());
    }

    #[tokio::test]
    async fn test_handle_archive_character_returns_not_found_for_unknown_id() {
        let character_id = Uuid::new_v4();
        let clock = FixedClock(fixed_now());
        let command = ArchiveCharacter {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            character_id,
        };

        let result = handle_archive_character(&command, &clock, &EmptyEventRepository).await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, character_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_reset_checklist_propagates_infrastructure_errors() {
        let clock = FixedClock(fixed_now());
        let repo: &dyn EventRepository = &FailingEventRepository;
        let command = ResetChecklist {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            character_id: Uuid::new_v4(),
            period: ChecklistPeriod::Weekly,
        };

        let result = handle_reset_checklist(&command, &clock, repo).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
