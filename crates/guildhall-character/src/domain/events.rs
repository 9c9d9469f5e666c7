//! Domain events for the Character Management context.

use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for `CharacterCreated`.
pub const CHARACTER_CREATED_EVENT_TYPE: &str = "character.created";
/// Event type for `ProfileUpdated`.
pub const PROFILE_UPDATED_EVENT_TYPE: &str = "character.profile_updated";
/// Event type for `StatsUpdated`.
pub const STATS_UPDATED_EVENT_TYPE: &str = "character.stats_updated";
/// Event type for `ChecklistRecorded`.
pub const CHECKLIST_RECORDED_EVENT_TYPE: &str = "character.checklist_recorded";
/// Event type for `ChecklistReset`.
pub const CHECKLIST_RESET_EVENT_TYPE: &str = "character.checklist_reset";
/// Event type for `CharacterArchived`.
pub const CHARACTER_ARCHIVED_EVENT_TYPE: &str = "character.archived";

/// Combat stats shown on a character sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Attack.
    pub atk: u64,
    /// Critical rate.
    pub cri: u32,
    /// Final damage.
    pub fd: u32,
    /// Elemental damage.
    pub element: u32,
    /// Hit points.
    pub hp: u64,
    /// Physical defense.
    pub pdef: u32,
    /// Magical defense.
    pub mdef: u32,
}

/// Checklist reset cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistPeriod {
    /// Resets every day.
    Daily,
    /// Resets every week.
    Weekly,
}

/// Emitted when a character is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterCreated {
    /// The character identifier.
    pub character_id: Uuid,
    /// The owning user's id.
    pub owner_id: String,
    /// The character's name.
    pub name: String,
    /// Current class.
    pub class: String,
    /// Base class the current class advanced from.
    pub main_class: String,
    /// Initial stats.
    pub stats: Stats,
}

/// Emitted when a character's name or class changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdated {
    /// The character identifier.
    pub character_id: Uuid,
    /// New name.
    pub name: String,
    /// New class.
    pub class: String,
    /// New main class.
    pub main_class: String,
}

/// Emitted when a character's stats are replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsUpdated {
    /// The character identifier.
    pub character_id: Uuid,
    /// New stats.
    pub stats: Stats,
}

/// Emitted when a checklist counter is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistRecorded {
    /// The character identifier.
    pub character_id: Uuid,
    /// Which checklist.
    pub period: ChecklistPeriod,
    /// Task key, e.g. a nest name.
    pub task: String,
    /// New count.
    pub count: u32,
}

/// Emitted when every counter of one checklist returns to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistReset {
    /// The character identifier.
    pub character_id: Uuid,
    /// Which checklist.
    pub period: ChecklistPeriod,
}

/// Emitted when a character is archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterArchived {
    /// The character identifier.
    pub character_id: Uuid,
}

/// Event payload variants for the Character Management context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CharacterEventKind {
    /// A character has been created.
    CharacterCreated(CharacterCreated),
    /// Name or class changed.
    ProfileUpdated(ProfileUpdated),
    /// Stats replaced.
    StatsUpdated(StatsUpdated),
    /// A checklist counter was set.
    ChecklistRecorded(ChecklistRecorded),
    /// A checklist was cleared.
    ChecklistReset(ChecklistReset),
    /// The character was archived.
    CharacterArchived(CharacterArchived),
}

impl CharacterEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CharacterCreated(_) => CHARACTER_CREATED_EVENT_TYPE,
            Self::ProfileUpdated(_) => PROFILE_UPDATED_EVENT_TYPE,
            Self::StatsUpdated(_) => STATS_UPDATED_EVENT_TYPE,
            Self::ChecklistRecorded(_) => CHECKLIST_RECORDED_EVENT_TYPE,
            Self::ChecklistReset(_) => CHECKLIST_RESET_EVENT_TYPE,
            Self::CharacterArchived(_) => CHARACTER_ARCHIVED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Character Management context.
#[derive(Debug, Clone)]
pub struct CharacterEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CharacterEventKind,
}

impl DomainEvent for CharacterEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("CharacterEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
