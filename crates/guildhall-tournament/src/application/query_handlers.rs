//! Query handlers for the Tournament Roster context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, streams_with_prefix};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_tournament, reconstitute};
use crate::domain::aggregates::Tournament;
use crate::domain::events::{Participant, TournamentStatus};

/// Read-only view of a tournament aggregate.
#[derive(Debug, Serialize)]
pub struct TournamentView {
    /// The tournament identifier.
    pub tournament_id: Uuid,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: TournamentStatus,
    /// Participant cap.
    pub max_participants: u32,
    /// Entries keyed by user id.
    pub participants: BTreeMap<String, Participant>,
    /// Creating leader.
    pub created_by: String,
    /// When the tournament was created.
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Tournament> for TournamentView {
    fn from(tournament: &Tournament) -> Self {
        Self {
            tournament_id: tournament.id,
            name: tournament.name.clone(),
            status: tournament.status,
            max_participants: tournament.max_participants,
            participants: tournament.participants.clone(),
            created_by: tournament.created_by.clone().unwrap_or_default(),
            created_at: tournament.created_at,
        }
    }
}

/// Retrieves a tournament by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
pub async fn get_tournament(
    tournament_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<TournamentView, DomainError> {
    let tournament = load_tournament(tournament_id, repo).await?;
    Ok(TournamentView::from(&tournament))
}

/// Lists every tournament in creation order.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_tournaments(
    repo: &dyn EventRepository,
) -> Result<Vec<TournamentView>, DomainError> {
    let all_events = repo.load_all_events().await?;
    streams_with_prefix(&all_events, "tournament.")
        .into_iter()
        .map(|(tournament_id, events)| {
            reconstitute(tournament_id, &events).map(|t| TournamentView::from(&t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use guildhall_core::actor::Actor;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_test_support::{FixedClock, fixed_now};

    use super::*;
    use crate::application::command_handlers::handle_create_tournament;
    use crate::domain::commands::CreateTournament;

    #[tokio::test]
    async fn test_get_tournament_returns_pending_view() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let tournament_id = Uuid::new_v4();
        let command = CreateTournament {
            correlation_id: Uuid::new_v4(),
            actor: Actor::guild_leader("9000", "boss"),
            tournament_id,
            name: " Spring Cup ".into(),
            max_participants: 16,
        };
        handle_create_tournament(&command, &FixedClock(fixed_now()), &repo)
            .await
            .unwrap();

        // Act
        let view = get_tournament(tournament_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.name, "Spring Cup");
        assert_eq!(view.status, TournamentStatus::Pending);
        assert_eq!(view.max_participants, 16);
        assert!(view.participants.is_empty());
        assert_eq!(list_tournaments(&repo).await.unwrap().len(), 1);
    }
}
