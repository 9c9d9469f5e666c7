//! Aggregate roots for the Donations context.

use chrono::{DateTime, Utc};
use guildhall_core::actor::Actor;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    DonationApproved, DonationEvent, DonationEventKind, DonationPledged, DonationRejected,
    DonationStatus, Donor, Gift,
};

/// The aggregate root for a donation.
#[derive(Debug)]
pub struct Donation {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) donor: Option<Donor>,
    pub(crate) gift: Option<Gift>,
    pub(crate) status: DonationStatus,
    pub(crate) decided_by: Option<String>,
    pub(crate) reason: Option<String>,
    pub(crate) pledged_at: Option<DateTime<Utc>>,
    pub(crate) decided_at: Option<DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<DonationEvent>,
}

impl Donation {
    /// Creates a new, empty donation.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            donor: None,
            gift: None,
            status: DonationStatus::Pending,
            decided_by: None,
            reason: None,
            pledged_at: None,
            decided_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the donation has been pledged.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.donor.is_some()
    }

    /// Review state.
    #[must_use]
    pub fn status(&self) -> DonationStatus {
        self.status
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: DonationEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = DonationEvent {
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

    /// Pledges `gift` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty gift and
    /// `DomainError::Conflict` (`donation_exists`) if the id is taken.
    pub fn pledge(
        &mut self,
        actor: &Actor,
        gift: Gift,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.exists() {
            return Err(DomainError::conflict(
                "donation_exists",
                format!("donation {} already exists", self.id),
            ));
        }
        match &gift {
            Gift::Gold { amount: 0 } => {
                return Err(DomainError::Validation("gold amount must be positive".into()));
            }
            Gift::Item { quantity: 0, .. } => {
                return Err(DomainError::Validation("item quantity must be positive".into()));
            }
            Gift::Item { name, .. } if name.trim().is_empty() => {
                return Err(DomainError::Validation("item name must not be empty".into()));
            }
            Gift::Gold { .. } | Gift::Item { .. } => {}
        }

        let kind = DonationEventKind::DonationPledged(DonationPledged {
            donation_id: self.id,
            donor: Donor {
                discord_id: actor.user_id.clone(),
                name: actor.display_name.clone(),
            },
            gift,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    fn ensure_decidable_by(&self, actor: &Actor) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        if !actor.is_guild_leader {
            return Err(DomainError::Unauthorized(
                "only guild leaders may review donations".into(),
            ));
        }
        if self.status != DonationStatus::Pending {
            return Err(DomainError::conflict(
                "donation_not_pending",
                format!("donation {} was already reviewed", self.id),
            ));
        }
        Ok(())
    }

    /// Approves the pending donation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthorized` for non-leaders and
    /// `DomainError::Conflict` (`donation_not_pending`) after a decision.
    pub fn approve(
        &mut self,
        actor: &Actor,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_decidable_by(actor)?;
        let kind = DonationEventKind::DonationApproved(DonationApproved {
            donation_id: self.id,
            decided_by: actor.user_id.clone(),
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Rejects the pending donation.
    ///
    /// # Errors
    ///
    /// See [`Donation::approve`].
    pub fn reject(
        &mut self,
        actor: &Actor,
        reason: Option<String>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_decidable_by(actor)?;
        let kind = DonationEventKind::DonationRejected(DonationRejected {
            donation_id: self.id,
            decided_by: actor.user_id.clone(),
            reason,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }
}

impl AggregateRoot for Donation {
    type Event = DonationEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            DonationEventKind::DonationPledged(payload) => {
                self.donor = Some(payload.donor.clone());
                self.gift = Some(payload.gift.clone());
                self.status = DonationStatus::Pending;
                self.pledged_at = Some(event.metadata.occurred_at);
            }
            DonationEventKind::DonationApproved(payload) => {
                self.status = DonationStatus::Approved;
                self.decided_by = Some(payload.decided_by.clone());
                self.decided_at = Some(event.metadata.occurred_at);
            }
            DonationEventKind::DonationRejected(payload) => {
                self.status = DonationStatus::Rejected;
                self.decided_by = Some(payload.decided_by.clone());
                self.reason.clone_from(&payload.reason);
                self.decided_at = Some(event.metadata.occurred_at);
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
