//! Query handlers for the Party Membership context.

use chrono::{DateTime, Utc};
use guildhall_core::error::DomainError;
use guildhall_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_party, load_roster};
use crate::domain::aggregates::Party;

/// A seat in a party view.
#[derive(Debug, Serialize)]
pub struct MemberView {
    /// The seated character.
    pub character_id: Uuid,
    /// The character's owner.
    pub user_id: String,
    /// When the seat was taken.
    pub joined_at: DateTime<Utc>,
}

/// Read-only view of a party aggregate.
#[derive(Debug, Serialize)]
pub struct PartyView {
    /// The party identifier.
    pub party_id: Uuid,
    /// The nest the party runs.
    pub nest: String,
    /// Member cap.
    pub max_member: u32,
    /// Forming user.
    pub created_by: String,
    /// When the party was formed.
    pub created_at: Option<DateTime<Utc>>,
    /// Seats, ordered by character id.
    pub members: Vec<MemberView>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Party> for PartyView {
    fn from(party: &Party) -> Self {
        Self {
            party_id: party.id,
            nest: party.nest.clone(),
            max_member: party.max_member,
            created_by: party.created_by.clone().unwrap_or_default(),
            created_at: party.created_at,
            members: party
                .members
                .iter()
                .map(|(character_id, seat)| MemberView {
                    character_id: *character_id,
                    user_id: seat.user_id.clone(),
                    joined_at: seat.joined_at,
                })
                .collect(),
            version: party.version,
        }
    }
}

/// Retrieves a party by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
pub async fn get_party_by_id(
    party_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<PartyView, DomainError> {
    let party = load_party(party_id, repo).await?;
    Ok(PartyView::from(&party))
}

/// Lists the parties formed in `nest`, oldest first. Unknown nests yield an
/// empty list.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_nest_parties(
    nest: &str,
    repo: &dyn EventRepository,
) -> Result<Vec<PartyView>, DomainError> {
    let roster = load_roster(nest, repo).await?;
    let mut views = Vec::with_capacity(roster.parties().len());
    for party_id in roster.parties() {
        let party = load_party(*party_id, repo).await?;
        views.push(PartyView::from(&party));
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use guildhall_core::actor::Actor;
    use guildhall_core::retry::RetryPolicy;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_test_support::{FixedClock, fixed_now};

    use super::*;
    use crate::application::command_handlers::handle_create_party;
    use crate::domain::commands::CreateParty;

    async fn create(repo: &InMemoryEventRepository, nest: &str) -> Uuid {
        let party_id = Uuid::new_v4();
        let command = CreateParty {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1000", "leader"),
            party_id,
            nest: nest.into(),
            max_member: 8,
        };
        handle_create_party(&command, &FixedClock(fixed_now()), repo, RetryPolicy::default())
            .await
            .unwrap();
        party_id
    }

    #[tokio::test]
    async fn test_get_party_by_id_returns_view() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let party_id = create(&repo, "Manticore Nest").await;

        // Act
        let view = get_party_by_id(party_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.party_id, party_id);
        assert_eq!(view.nest, "Manticore Nest");
        assert_eq!(view.max_member, 8);
        assert_eq!(view.created_by, "1000");
        assert_eq!(view.created_at, Some(fixed_now()));
        assert!(view.members.is_empty());
    }

    #[tokio::test]
    async fn test_list_nest_parties_matches_nest_case_insensitively() {
        let repo = InMemoryEventRepository::new();
        let first = create(&repo, "Manticore Nest").await;
        let second = create(&repo, "manticore nest").await;
        create(&repo, "Sea Dragon Nest").await;

        let views = list_nest_parties("MANTICORE NEST ", &repo).await.unwrap();

        let ids: Vec<Uuid> = views.iter().map(|v| v.party_id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(views.iter().all(|v| v.nest == "Manticore Nest"));
    }

    #[tokio::test]
    async fn test_list_nest_parties_for_unknown_nest_is_empty() {
        let repo = InMemoryEventRepository::new();

        let views = list_nest_parties("Nowhere", &repo).await.unwrap();

        assert!(views.is_empty());
    }
}
