//! Query handlers for the Character Management context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use std::collections::BTreeMap;

use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, streams_with_prefix};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::aggregates::Character;
use crate::domain::events::Stats;

/// Read-only view of a character aggregate.
#[derive(Debug, Serialize)]
pub struct CharacterView {
    /// The character identifier.
    pub character_id: Uuid,
    /// The owning user's id.
    pub owner_id: String,
    /// Name.
    pub name: String,
    /// Current class.
    pub class: String,
    /// Base class.
    pub main_class: String,
    /// Combat stats.
    pub stats: Stats,
    /// Daily checklist counters.
    pub daily: BTreeMap<String, u32>,
    /// Weekly checklist counters.
    pub weekly: BTreeMap<String, u32>,
    /// Whether the character is archived.
    pub archived: bool,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Character> for CharacterView {
    fn from(character: &Character) -> Self {
        Self {
            character_id: character.id,
            owner_id: character.owner_id.clone().unwrap_or_default(),
            name: character.name.clone(),
            class: character.class.clone(),
            main_class: character.main_class.clone(),
            stats: character.stats,
            daily: character.daily.clone(),
            weekly: character.weekly.clone(),
            archived: character.archived,
            version: character.version,
        }
    }
}

/// Retrieves a character by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_character_by_id(
    character_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<CharacterView, DomainError> {
    let character = command_handlers::load_character(character_id, repo).await?;
    Ok(CharacterView::from(&character))
}

/// Lists characters, optionally restricted to one owner. Archived characters
/// are included; callers filter on `archived`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_characters(
    owner_id: Option<&str>,
    repo: &dyn EventRepository,
) -> Result<Vec<CharacterView>, DomainError> {
    let all_events = repo.load_all_events().await?;
    let mut views = Vec::new();
    for (character_id, events) in streams_with_prefix(&all_events, "character.") {
        let character = command_handlers::reconstitute(character_id, &events)?;
        if owner_id.is_none_or(|owner| character.owner_id() == Some(owner)) {
            views.push(CharacterView::from(&character));
        }
    }
    Ok(views)
}
