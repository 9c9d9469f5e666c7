//! Aggregate roots for the Tournament Roster context.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use guildhall_character::domain::aggregates::Character;
use guildhall_core::actor::Actor;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    Participant, ParticipantJoined, TournamentCompleted, TournamentCreated, TournamentEvent,
    TournamentEventKind, TournamentStarted, TournamentStatus,
};

/// Conflict code: sign-ups are closed.
pub const TOURNAMENT_NOT_PENDING: &str = "tournament_not_pending";
/// Conflict code: every slot is taken.
pub const TOURNAMENT_FULL: &str = "tournament_full";
/// Conflict code: the user already has an entry.
pub const ALREADY_REGISTERED: &str = "already_registered";
/// Conflict code: the lifecycle step is not legal from the current status.
pub const INVALID_TRANSITION: &str = "invalid_transition";

/// Smallest allowed participant cap.
pub const MIN_PARTICIPANTS: u32 = 2;

/// Legal status steps: (from, to).
const STATUS_STEPS: [(TournamentStatus, TournamentStatus); 2] = [
    (TournamentStatus::Pending, TournamentStatus::Active),
    (TournamentStatus::Active, TournamentStatus::Completed),
];

/// The aggregate root for a tournament.
#[derive(Debug)]
pub struct Tournament {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) name: String,
    pub(crate) status: TournamentStatus,
    pub(crate) max_participants: u32,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    /// User id → entry.
    pub(crate) participants: BTreeMap<String, Participant>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<TournamentEvent>,
}

impl Tournament {
    /// Creates a new, empty tournament.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: String::new(),
            status: TournamentStatus::Pending,
            max_participants: 0,
            created_by: None,
            created_at: None,
            participants: BTreeMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the tournament has been created.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.created_by.is_some()
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> TournamentStatus {
        self.status
    }

    /// Entries keyed by user id.
    #[must_use]
    pub fn participants(&self) -> &BTreeMap<String, Participant> {
        &self.participants
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: TournamentEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = TournamentEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Creates the tournament.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-leaders,
    /// `DomainError::Validation` for an empty name or a cap below two, and
    /// `DomainError::Conflict` (`tournament_exists`) if the id is taken.
    pub fn create(
        &mut self,
        actor: &Actor,
        name: String,
        max_participants: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !actor.is_guild_leader {
            return Err(DomainError::Unauthorized(
                "only guild leaders may create tournaments".into(),
            ));
        }
        if name.trim().is_empty() {
            return Err(DomainError::Validation("tournament name must not be empty".into()));
        }
        if max_participants < MIN_PARTICIPANTS {
            return Err(DomainError::Validation(format!(
                "max_participants must be at least {MIN_PARTICIPANTS}"
            )));
        }
        if self.exists() {
            return Err(DomainError::conflict(
                "tournament_exists",
                format!("tournament {} already exists", self.id),
            ));
        }

        let kind = TournamentEventKind::TournamentCreated(TournamentCreated {
            tournament_id: self.id,
            name,
            max_participants,
            created_by: actor.user_id.clone(),
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Signs `actor` up with `character`.
    ///
    /// # Errors
    ///
    /// Returns the character ownership errors, and `DomainError::Conflict`
    /// with `tournament_not_pending`, `already_registered` or
    /// `tournament_full`.
    pub fn join(
        &mut self,
        actor: &Actor,
        character: &Character,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        character.ensure_usable_by(actor)?;
        if self.status != TournamentStatus::Pending {
            return Err(DomainError::conflict(
                TOURNAMENT_NOT_PENDING,
                format!("tournament {} is no longer taking sign-ups", self.id),
            ));
        }
        if self.participants.contains_key(&actor.user_id) {
            return Err(DomainError::conflict(
                ALREADY_REGISTERED,
                format!("user {} is already registered", actor.user_id),
            ));
        }
        if self.participants.len() >= self.max_participants as usize {
            return Err(DomainError::conflict(
                TOURNAMENT_FULL,
                format!(
                    "tournament {} has {} of {} participants",
                    self.id,
                    self.participants.len(),
                    self.max_participants
                ),
            ));
        }

        let kind = TournamentEventKind::ParticipantJoined(ParticipantJoined {
            tournament_id: self.id,
            user_id: actor.user_id.clone(),
            participant: Participant {
                character_id: character.id,
                character_name: character.name().to_owned(),
                class: character.class().to_owned(),
            },
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    fn step_to(
        &mut self,
        actor: &Actor,
        to: TournamentStatus,
        kind: TournamentEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        if !actor.is_guild_leader {
            return Err(DomainError::Unauthorized(
                "only guild leaders may run tournaments".into(),
            ));
        }
        if !STATUS_STEPS.contains(&(self.status, to)) {
            return Err(DomainError::conflict(
                INVALID_TRANSITION,
                format!("tournament {} cannot go from {:?} to {to:?}", self.id, self.status),
            ));
        }
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Closes sign-ups and starts play.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-leaders and
    /// `DomainError::Conflict` (`invalid_transition`) unless pending.
    pub fn start(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let kind = TournamentEventKind::TournamentStarted(TournamentStarted {
            tournament_id: self.id,
        });
        self.step_to(actor, TournamentStatus::Active, kind, correlation_id, clock)
    }

    /// Ends the tournament.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-leaders and
    /// `DomainError::Conflict` (`invalid_transition`) unless active.
    pub fn complete(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let kind = TournamentEventKind::TournamentCompleted(TournamentCompleted {
            tournament_id: self.id,
        });
        self.step_to(actor, TournamentStatus::Completed, kind, correlation_id, clock)
    }
}

impl AggregateRoot for Tournament {
    type Event = TournamentEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            TournamentEventKind::TournamentCreated(payload) => {
                self.name.clone_from(&payload.name);
                self.max_participants = payload.max_participants;
                self.created_by = Some(payload.created_by.clone());
                self.created_at = Some(event.metadata.occurred_at);
                self.status = TournamentStatus::Pending;
            }
            TournamentEventKind::ParticipantJoined(payload) => {
                self.participants
                    .insert(payload.user_id.clone(), payload.participant.clone());
            }
            TournamentEventKind::TournamentStarted(_) => {
                self.status = TournamentStatus::Active;
            }
            TournamentEventKind::TournamentCompleted(_) => {
                self.status = TournamentStatus::Completed;
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use guildhall_character::domain::events::Stats;
    use guildhall_test_support::{FixedClock, fixed_now};

    use super::*;

    fn commit<A: AggregateRoot>(aggregate: &mut A)
    where
        A::Event: Clone,
    {
        let events = aggregate.uncommitted_events().to_vec();
        for event in &events {
            aggregate.apply(event);
        }
        aggregate.clear_uncommitted_events();
    }

    fn character_of(owner: &Actor) -> Character {
        let mut character = Character::new(Uuid::new_v4());
        character
            .create(
                owner,
                format!("{} main", owner.display_name),
                "Moonlord".into(),
                "Sorceress".into(),
                Stats::default(),
                Uuid::new_v4(),
                &FixedClock(fixed_now()),
            )
            .unwrap();
        commit(&mut character);
        character
    }

    fn tournament(max_participants: u32) -> Tournament {
        let mut tournament = Tournament::new(Uuid::new_v4());
        tournament
            .create(
                &Actor::guild_leader("9000", "boss"),
                "Spring Cup".into(),
                max_participants,
                Uuid::new_v4(),
                &FixedClock(fixed_now()),
            )
            .unwrap();
        commit(&mut tournament);
        tournament
    }

    fn sign_up(tournament: &mut Tournament, actor: &Actor) -> Result<(), DomainError> {
        let character = character_of(actor);
        tournament.join(actor, &character, Uuid::new_v4(), &FixedClock(fixed_now()))?;
        commit(tournament);
        Ok(())
    }

    #[test]
    fn test_create_requires_guild_leader_and_cap_of_two() {
        let clock = FixedClock(fixed_now());
        let mut tournament = Tournament::new(Uuid::new_v4());

        let by_member = tournament.create(
            &Actor::member("1001", "aster"),
            "Cup".into(),
            8,
            Uuid::new_v4(),
            &clock,
        );
        let too_small = tournament.create(
            &Actor::guild_leader("9000", "boss"),
            "Cup".into(),
            1,
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(by_member, Err(DomainError::Unauthorized(_))));
        assert!(matches!(too_small, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_cap_of_two_rejects_third_and_duplicate_sign_ups() {
        // Arrange
        let mut tournament = tournament(2);
        let first = Actor::member("1001", "aster");
        sign_up(&mut tournament, &first).unwrap();
        sign_up(&mut tournament, &Actor::member("1002", "bryn")).unwrap();

        // Act
        let third = sign_up(&mut tournament, &Actor::member("1003", "cato"));
        let duplicate = sign_up(&mut tournament, &first);

        // Assert
        assert_eq!(third.unwrap_err().conflict_code(), Some(TOURNAMENT_FULL));
        assert_eq!(duplicate.unwrap_err().conflict_code(), Some(ALREADY_REGISTERED));
        assert_eq!(tournament.participants().len(), 2);
        assert!(tournament.uncommitted_events().is_empty());
    }

    #[test]
    fn test_join_records_character_name_and_class() {
        let mut tournament = tournament(4);
        let actor = Actor::member("1001", "aster");

        sign_up(&mut tournament, &actor).unwrap();

        let entry = &tournament.participants()["1001"];
        assert_eq!(entry.character_name, "aster main");
        assert_eq!(entry.class, "Moonlord");
    }

    #[test]
    fn test_join_after_start_is_not_pending() {
        let clock = FixedClock(fixed_now());
        let mut tournament = tournament(4);
        tournament
            .start(&Actor::guild_leader("9000", "boss"), Uuid::new_v4(), &clock)
            .unwrap();
        commit(&mut tournament);

        let result = sign_up(&mut tournament, &Actor::member("1001", "aster"));

        assert_eq!(result.unwrap_err().conflict_code(), Some(TOURNAMENT_NOT_PENDING));
    }

    #[test]
    fn test_complete_before_start_is_invalid_transition() {
        let clock = FixedClock(fixed_now());
        let mut tournament = tournament(4);

        let result = tournament.complete(&Actor::guild_leader("9000", "boss"), Uuid::new_v4(), &clock);

        assert_eq!(result.unwrap_err().conflict_code(), Some(INVALID_TRANSITION));
        assert_eq!(tournament.status(), TournamentStatus::Pending);
    }
}
