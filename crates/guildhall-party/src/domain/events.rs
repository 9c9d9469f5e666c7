//! Domain events for the Party Membership context.
//!
//! `party.*` events live on party streams, `nest.*` events on nest roster
//! streams.

use chrono::{DateTime, Utc};
use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for `PartyCreated`.
pub const PARTY_CREATED_EVENT_TYPE: &str = "party.created";
/// Event type for `MemberJoined`.
pub const MEMBER_JOINED_EVENT_TYPE: &str = "party.member_joined";
/// Event type for `MemberLeft`.
pub const MEMBER_LEFT_EVENT_TYPE: &str = "party.member_left";
/// Event type for `PartyRegistered`.
pub const PARTY_REGISTERED_EVENT_TYPE: &str = "nest.party_registered";
/// Event type for `CharacterPlaced`.
pub const CHARACTER_PLACED_EVENT_TYPE: &str = "nest.character_placed";
/// Event type for `CharacterReleased`.
pub const CHARACTER_RELEASED_EVENT_TYPE: &str = "nest.character_released";

/// Emitted when a party is formed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyCreated {
    /// The party identifier.
    pub party_id: Uuid,
    /// The nest the party runs.
    pub nest: String,
    /// Member cap.
    pub max_member: u32,
    /// User who formed the party.
    pub created_by: String,
}

/// Emitted when a character joins a party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberJoined {
    /// The party identifier.
    pub party_id: Uuid,
    /// The party's nest.
    pub nest: String,
    /// The joining character.
    pub character_id: Uuid,
    /// The character's owner.
    pub user_id: String,
    /// When the join was accepted.
    pub joined_at: DateTime<Utc>,
}

/// Emitted when a character leaves a party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberLeft {
    /// The party identifier.
    pub party_id: Uuid,
    /// The party's nest.
    pub nest: String,
    /// The leaving character.
    pub character_id: Uuid,
    /// The character's owner.
    pub user_id: String,
}

/// Event payload variants for party streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartyEventKind {
    /// A party has been formed.
    PartyCreated(PartyCreated),
    /// A character joined.
    MemberJoined(MemberJoined),
    /// A character left.
    MemberLeft(MemberLeft),
}

impl PartyEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PartyCreated(_) => PARTY_CREATED_EVENT_TYPE,
            Self::MemberJoined(_) => MEMBER_JOINED_EVENT_TYPE,
            Self::MemberLeft(_) => MEMBER_LEFT_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for party streams.
#[derive(Debug, Clone)]
pub struct PartyEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: PartyEventKind,
}

impl DomainEvent for PartyEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("PartyEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Emitted on the roster when a party is formed in the nest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRegistered {
    /// The nest.
    pub nest: String,
    /// The new party.
    pub party_id: Uuid,
}

/// Emitted on the roster when a character takes a seat in one of its parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterPlaced {
    /// The nest.
    pub nest: String,
    /// The character.
    pub character_id: Uuid,
    /// The party holding the character.
    pub party_id: Uuid,
}

/// Emitted on the roster when a character gives up its seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterReleased {
    /// The nest.
    pub nest: String,
    /// The character.
    pub character_id: Uuid,
    /// The party the character left.
    pub party_id: Uuid,
}

/// Event payload variants for nest roster streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NestRosterEventKind {
    /// A party was formed in the nest.
    PartyRegistered(PartyRegistered),
    /// A character took a seat.
    CharacterPlaced(CharacterPlaced),
    /// A character gave up its seat.
    CharacterReleased(CharacterReleased),
}

impl NestRosterEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PartyRegistered(_) => PARTY_REGISTERED_EVENT_TYPE,
            Self::CharacterPlaced(_) => CHARACTER_PLACED_EVENT_TYPE,
            Self::CharacterReleased(_) => CHARACTER_RELEASED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for nest roster streams.
#[derive(Debug, Clone)]
pub struct NestRosterEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: NestRosterEventKind,
}

impl DomainEvent for NestRosterEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("NestRosterEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
