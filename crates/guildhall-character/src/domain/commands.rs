//! Commands for the Character Management context.

use guildhall_core::actor::Actor;
use uuid::Uuid;

use super::events::{ChecklistPeriod, Stats};

/// Command to create a new character.
#[derive(Debug, Clone)]
pub struct CreateCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The creating user, who becomes the owner.
    pub actor: Actor,
    /// The new character's identifier.
    pub character_id: Uuid,
    /// The character's name.
    pub name: String,
    /// Current class.
    pub class: String,
    /// Base class.
    pub main_class: String,
    /// Initial stats.
    pub stats: Stats,
}

/// Command to rename or reclass a character.
#[derive(Debug, Clone)]
pub struct UpdateProfile {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user.
    pub actor: Actor,
    /// The character identifier.
    pub character_id: Uuid,
    /// New name.
    pub name: String,
    /// New class.
    pub class: String,
    /// New main class.
    pub main_class: String,
}

/// Command to replace a character's stats.
#[derive(Debug, Clone)]
pub struct UpdateStats {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user.
    pub actor: Actor,
    /// The character identifier.
    pub character_id: Uuid,
    /// New stats.
    pub stats: Stats,
}

/// Command to set a checklist counter.
#[derive(Debug, Clone)]
pub struct RecordChecklist {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user.
    pub actor: Actor,
    /// The character identifier.
    pub character_id: Uuid,
    /// Which checklist.
    pub period: ChecklistPeriod,
    /// Task key.
    pub task: String,
    /// New count.
    pub count: u32,
}

/// Command to clear a checklist.
#[derive(Debug, Clone)]
pub struct ResetChecklist {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user.
    pub actor: Actor,
    /// The character identifier.
    pub character_id: Uuid,
    /// Which checklist.
    pub period: ChecklistPeriod,
}

/// Command to archive a character.
#[derive(Debug, Clone)]
pub struct ArchiveCharacter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The requesting user.
    pub actor: Actor,
    /// The character identifier.
    pub character_id: Uuid,
}

guildhall_core::impl_command! {
    CreateCharacter => "character.create_character",
    UpdateProfile => "character.update_profile",
    UpdateStats => "character.update_stats",
    RecordChecklist => "character.record_checklist",
    ResetChecklist => "character.reset_checklist",
    ArchiveCharacter => "character.archive_character",
}
