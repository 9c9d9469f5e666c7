//! Aggregate roots for the Party Membership context.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::event::EventMetadata;
use guildhall_core::identity::{NEST_NAMESPACE, derived_stream_id};
use uuid::Uuid;

use super::events::{
    CharacterPlaced, CharacterReleased, MemberJoined, MemberLeft, NestRosterEvent,
    NestRosterEventKind, PartyCreated, PartyEvent, PartyEventKind, PartyRegistered,
};

/// Largest party the guild runs.
pub const MAX_PARTY_SIZE: u32 = 32;

/// Returns the roster stream id for `nest`. Nest names compare
/// case-insensitively and ignore surrounding whitespace.
#[must_use]
pub fn nest_roster_id(nest: &str) -> Uuid {
    derived_stream_id(&NEST_NAMESPACE, &nest.trim().to_lowercase())
}

/// A seat in a party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Owner of the seated character.
    pub user_id: String,
    /// When the join was accepted.
    pub joined_at: DateTime<Utc>,
}

/// The aggregate root for a party.
#[derive(Debug)]
pub struct Party {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) nest: String,
    pub(crate) max_member: u32,
    pub(crate) created_by: Option<String>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) members: BTreeMap<Uuid, Membership>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<PartyEvent>,
}

impl Party {
    /// Creates a new, empty party.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            nest: String::new(),
            max_member: 0,
            created_by: None,
            created_at: None,
            members: BTreeMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the party has been formed.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.created_by.is_some()
    }

    /// The party's nest.
    #[must_use]
    pub fn nest(&self) -> &str {
        &self.nest
    }

    /// Current seats, keyed by character id.
    #[must_use]
    pub fn members(&self) -> &BTreeMap<Uuid, Membership> {
        &self.members
    }

    /// Whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_member as usize
    }

    /// Whether `user_id` already holds a seat with any character.
    #[must_use]
    pub fn has_user(&self, user_id: &str) -> bool {
        self.members.values().any(|m| m.user_id == user_id)
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: PartyEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = PartyEvent {
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

    pub(crate) fn record_created(
        &mut self,
        nest: String,
        max_member: u32,
        created_by: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = PartyEventKind::PartyCreated(PartyCreated {
            party_id: self.id,
            nest,
            max_member,
            created_by,
        });
        self.record(kind, correlation_id, clock);
    }

    pub(crate) fn record_joined(
        &mut self,
        character_id: Uuid,
        user_id: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = PartyEventKind::MemberJoined(MemberJoined {
            party_id: self.id,
            nest: self.nest.clone(),
            character_id,
            user_id,
            joined_at: clock.now(),
        });
        self.record(kind, correlation_id, clock);
    }

    pub(crate) fn record_left(
        &mut self,
        character_id: Uuid,
        user_id: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = PartyEventKind::MemberLeft(MemberLeft {
            party_id: self.id,
            nest: self.nest.clone(),
            character_id,
            user_id,
        });
        self.record(kind, correlation_id, clock);
    }
}

impl AggregateRoot for Party {
    type Event = PartyEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            PartyEventKind::PartyCreated(payload) => {
                self.nest.clone_from(&payload.nest);
                self.max_member = payload.max_member;
                self.created_by = Some(payload.created_by.clone());
                self.created_at = Some(event.metadata.occurred_at);
            }
            PartyEventKind::MemberJoined(payload) => {
                self.members.insert(
                    payload.character_id,
                    Membership {
                        user_id: payload.user_id.clone(),
                        joined_at: payload.joined_at,
                    },
                );
            }
            PartyEventKind::MemberLeft(payload) => {
                self.members.remove(&payload.character_id);
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

/// The aggregate root tracking seats across every party of one nest.
#[derive(Debug)]
pub struct NestRoster {
    /// Aggregate identifier, derived from the nest name.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) nest: String,
    pub(crate) parties: Vec<Uuid>,
    /// Character id → party id.
    pub(crate) placements: HashMap<Uuid, Uuid>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<NestRosterEvent>,
}

impl NestRoster {
    /// Creates an empty roster for `nest`.
    #[must_use]
    pub fn new(nest: &str) -> Self {
        Self {
            id: nest_roster_id(nest),
            version: 0,
            nest: nest.trim().to_owned(),
            parties: Vec::new(),
            placements: HashMap::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Parties formed in this nest, oldest first.
    #[must_use]
    pub fn parties(&self) -> &[Uuid] {
        &self.parties
    }

    /// The party currently holding `character_id`, if any.
    #[must_use]
    pub fn placement_of(&self, character_id: Uuid) -> Option<Uuid> {
        self.placements.get(&character_id).copied()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: NestRosterEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = NestRosterEvent {
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

    pub(crate) fn record_party_registered(
        &mut self,
        party_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = NestRosterEventKind::PartyRegistered(PartyRegistered {
            nest: self.nest.clone(),
            party_id,
        });
        self.record(kind, correlation_id, clock);
    }

    pub(crate) fn record_placed(
        &mut self,
        character_id: Uuid,
        party_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = NestRosterEventKind::CharacterPlaced(CharacterPlaced {
            nest: self.nest.clone(),
            character_id,
            party_id,
        });
        self.record(kind, correlation_id, clock);
    }

    pub(crate) fn record_released(
        &mut self,
        character_id: Uuid,
        party_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let kind = NestRosterEventKind::CharacterReleased(CharacterReleased {
            nest: self.nest.clone(),
            character_id,
            party_id,
        });
        self.record(kind, correlation_id, clock);
    }
}

impl AggregateRoot for NestRoster {
    type Event = NestRosterEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            NestRosterEventKind::PartyRegistered(payload) => {
                // The first party fixes the nest's display spelling.
                if self.parties.is_empty() {
                    self.nest.clone_from(&payload.nest);
                }
                self.parties.push(payload.party_id);
            }
            NestRosterEventKind::CharacterPlaced(payload) => {
                self.placements
                    .insert(payload.character_id, payload.party_id);
            }
            NestRosterEventKind::CharacterReleased(payload) => {
                self.placements.remove(&payload.character_id);
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
