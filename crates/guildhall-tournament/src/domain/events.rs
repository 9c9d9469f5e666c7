//! Domain events for the Tournament Roster context.

use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for `TournamentCreated`.
pub const TOURNAMENT_CREATED_EVENT_TYPE: &str = "tournament.created";
/// Event type for `ParticipantJoined`.
pub const PARTICIPANT_JOINED_EVENT_TYPE: &str = "tournament.participant_joined";
/// Event type for `TournamentStarted`.
pub const TOURNAMENT_STARTED_EVENT_TYPE: &str = "tournament.started";
/// Event type for `TournamentCompleted`.
pub const TOURNAMENT_COMPLETED_EVENT_TYPE: &str = "tournament.completed";

/// Where a tournament is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Taking sign-ups.
    #[default]
    Pending,
    /// Matches under way.
    Active,
    /// Finished.
    Completed,
}

/// A signed-up entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// The entered character.
    pub character_id: Uuid,
    /// Character name at sign-up.
    pub character_name: String,
    /// Character class at sign-up.
    pub class: String,
}

/// Emitted when a guild leader creates a tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentCreated {
    /// The tournament identifier.
    pub tournament_id: Uuid,
    /// Display name.
    pub name: String,
    /// Participant cap.
    pub max_participants: u32,
    /// Creating leader.
    pub created_by: String,
}

/// Emitted when a user signs up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJoined {
    /// The tournament identifier.
    pub tournament_id: Uuid,
    /// The signing-up user.
    pub user_id: String,
    /// The entry.
    pub participant: Participant,
}

/// Emitted when sign-ups close and play begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentStarted {
    /// The tournament identifier.
    pub tournament_id: Uuid,
}

/// Emitted when the tournament ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentCompleted {
    /// The tournament identifier.
    pub tournament_id: Uuid,
}

/// Event payload variants for the Tournament Roster context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TournamentEventKind {
    /// A tournament was created.
    TournamentCreated(TournamentCreated),
    /// A user signed up.
    ParticipantJoined(ParticipantJoined),
    /// Play began.
    TournamentStarted(TournamentStarted),
    /// Play ended.
    TournamentCompleted(TournamentCompleted),
}

impl TournamentEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TournamentCreated(_) => TOURNAMENT_CREATED_EVENT_TYPE,
            Self::ParticipantJoined(_) => PARTICIPANT_JOINED_EVENT_TYPE,
            Self::TournamentStarted(_) => TOURNAMENT_STARTED_EVENT_TYPE,
            Self::TournamentCompleted(_) => TOURNAMENT_COMPLETED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Tournament Roster context.
#[derive(Debug, Clone)]
pub struct TournamentEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: TournamentEventKind,
}

impl DomainEvent for TournamentEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("TournamentEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
