//! Aggregate roots for the Character Management context.

use std::collections::BTreeMap;

use guildhall_core::actor::Actor;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    CharacterArchived, CharacterCreated, CharacterEvent, CharacterEventKind, ChecklistPeriod,
    ChecklistRecorded, ChecklistReset, ProfileUpdated, Stats, StatsUpdated,
};

/// The aggregate root for a character.
#[derive(Debug)]
pub struct Character {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) owner_id: Option<String>,
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) main_class: String,
    pub(crate) stats: Stats,
    pub(crate) daily: BTreeMap<String, u32>,
    pub(crate) weekly: BTreeMap<String, u32>,
    pub(crate) archived: bool,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<CharacterEvent>,
}

impl Character {
    /// Creates a new, empty character.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            owner_id: None,
            name: String::new(),
            class: String::new(),
            main_class: String::new(),
            stats: Stats::default(),
            daily: BTreeMap::new(),
            weekly: BTreeMap::new(),
            archived: false,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the character has been created.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.owner_id.is_some()
    }

    /// The owning user's id, if created.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// The character's current name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The character's current class.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Whether the character has been archived.
    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.archived
    }

    /// Checks that `actor` owns this character and it is still active.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the character does not
    /// exist, `DomainError::Unauthorized` if `actor` is not the owner, and
    /// `DomainError::Conflict` (`character_archived`) if it is archived.
    pub fn ensure_usable_by(&self, actor: &Actor) -> Result<(), DomainError> {
        match self.owner_id.as_deref() {
            None => Err(DomainError::AggregateNotFound(self.id)),
            Some(owner) if !actor.is(owner) => Err(DomainError::Unauthorized(format!(
                "character {} belongs to another user",
                self.id
            ))),
            Some(_) if self.archived => Err(DomainError::conflict(
                "character_archived",
                format!("character {} is archived", self.id),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: CharacterEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = CharacterEvent {
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

    /// Creates the character for `owner`, producing a `CharacterCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` (`character_exists`) if the id is taken.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        owner: &Actor,
        name: String,
        class: String,
        main_class: String,
        stats: Stats,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.exists() {
            return Err(DomainError::conflict(
                "character_exists",
                format!("character {} already exists", self.id),
            ));
        }
        let kind = CharacterEventKind::CharacterCreated(CharacterCreated {
            character_id: self.id,
            owner_id: owner.user_id.clone(),
            name,
            class,
            main_class,
            stats,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Renames or reclasses the character, producing a `ProfileUpdated` event.
    ///
    /// # Errors
    ///
    /// See [`Character::ensure_usable_by`].
    pub fn update_profile(
        &mut self,
        actor: &Actor,
        name: String,
        class: String,
        main_class: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_usable_by(actor)?;
        let kind = CharacterEventKind::ProfileUpdated(ProfileUpdated {
            character_id: self.id,
            name,
            class,
            main_class,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Replaces the character's stats, producing a `StatsUpdated` event.
    ///
    /// # Errors
    ///
    /// See [`Character::ensure_usable_by`].
    pub fn update_stats(
        &mut self,
        actor: &Actor,
        stats: Stats,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_usable_by(actor)?;
        let kind = CharacterEventKind::StatsUpdated(StatsUpdated {
            character_id: self.id,
            stats,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Sets one checklist counter, producing a `ChecklistRecorded` event.
    ///
    /// # Errors
    ///
    /// See [`Character::ensure_usable_by`]; `DomainError::Validation` for an
    /// empty task key.
    pub fn record_checklist(
        &mut self,
        actor: &Actor,
        period: ChecklistPeriod,
        task: String,
        count: u32,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_usable_by(actor)?;
        if task.trim().is_empty() {
            return Err(DomainError::Validation(
                "checklist task must not be empty".into(),
            ));
        }
        let kind = CharacterEventKind::ChecklistRecorded(ChecklistRecorded {
            character_id: self.id,
            period,
            task,
            count,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Clears one checklist, producing a `ChecklistReset` event.
    ///
    /// # Errors
    ///
    /// See [`Character::ensure_usable_by`].
    pub fn reset_checklist(
        &mut self,
        actor: &Actor,
        period: ChecklistPeriod,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_usable_by(actor)?;
        let kind = CharacterEventKind::ChecklistReset(ChecklistReset {
            character_id: self.id,
            period,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Archives the character, producing a `CharacterArchived` event.
    /// Archived characters stay readable but accept no further changes.
    ///
    /// # Errors
    ///
    /// See [`Character::ensure_usable_by`].
    pub fn archive(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_usable_by(actor)?;
        let kind = CharacterEventKind::CharacterArchived(CharacterArchived {
            character_id: self.id,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }
}

impl AggregateRoot for Character {
    type Event = CharacterEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            CharacterEventKind::CharacterCreated(payload) => {
                self.owner_id = Some(payload.owner_id.clone());
                self.name.clone_from(&payload.name);
                self.class.clone_from(&payload.class);
                self.main_class.clone_from(&payload.main_class);
                self.stats = payload.stats;
            }
            CharacterEventKind::ProfileUpdated(payload) => {
                self.name.clone_from(&payload.name);
                self.class.clone_from(&payload.class);
                self.main_class.clone_from(&payload.main_class);
            }
            CharacterEventKind::StatsUpdated(payload) => {
                self.stats = payload.stats;
            }
            CharacterEventKind::ChecklistRecorded(payload) => {
                let checklist = match payload.period {
                    ChecklistPeriod::Daily => &mut self.daily,
                    ChecklistPeriod::Weekly => &mut self.weekly,
                };
                checklist.insert(payload.task.clone(), payload.count);
            }
            CharacterEventKind::ChecklistReset(payload) => match payload.period {
                ChecklistPeriod::Daily => self.daily.clear(),
                ChecklistPeriod::Weekly => self.weekly.clear(),
            },
            CharacterEventKind::CharacterArchived(_) => {
                self.archived = true;
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
