//! Command handlers for the Donations context.

use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent};
use guildhall_core::retry::{RetryPolicy, retry_on_conflict};
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::Donation;
use crate::domain::commands::{ApproveDonation, PledgeDonation, RejectDonation};
use crate::domain::events::{DonationEvent, DonationEventKind};

/// Reconstitutes a `Donation` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    donation_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Donation, DomainError> {
    let mut donation = Donation::new(donation_id);
    for stored in existing_events {
        let kind: DonationEventKind = decode_payload(stored)?;
        donation.apply(&DonationEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(donation)
}

/// Loads and reconstitutes an existing donation.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the donation has no events.
pub async fn load_donation(
    donation_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Donation, DomainError> {
    let existing_events = repo.load_events(donation_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(donation_id));
    }
    reconstitute(donation_id, &existing_events)
}

async fn persist(
    donation: &Donation,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = donation
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();

    repo.append_events(donation.id, donation.version(), &stored_events)
        .await?;
    debug!(donation_id = %donation.id, count = stored_events.len(), "donation events persisted");

    Ok(stored_events)
}

/// Handles the `PledgeDonation` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty gift and `DomainError` if
/// appending fails.
pub async fn handle_pledge_donation(
    command: &PledgeDonation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let existing_events = repo.load_events(command.donation_id).await?;
    let mut donation = reconstitute(command.donation_id, &existing_events)?;
    donation.pledge(
        &command.actor,
        command.gift.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&donation, repo).await
}

/// Handles the `ApproveDonation` command.
///
/// # Errors
///
/// Returns `DomainError::Unauthorized` for non-leaders and
/// `DomainError::Conflict` (`donation_not_pending`) once reviewed.
pub async fn handle_approve_donation(
    command: &ApproveDonation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || async move {
        let mut donation = load_donation(command.donation_id, repo).await?;
        donation.approve(&command.actor, command.correlation_id, clock)?;
        persist(&donation, repo).await
    })
    .await
}

/// Handles the `RejectDonation` command.
///
/// # Errors
///
/// See [`handle_approve_donation`].
pub async fn handle_reject_donation(
    command: &RejectDonation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || async move {
        let mut donation = load_donation(command.donation_id, repo).await?;
        donation.reject(
            &command.actor,
            command.reason.clone(),
            command.correlation_id,
            clock,
        )?;
        persist(&donation, repo).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use guildhall_core::actor::Actor;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_test_support::{FixedClock, RecordingEventRepository, fixed_now};

    use super::*;
    use crate::domain::events::{DONATION_PLEDGED_EVENT_TYPE, DonationStatus, Gift};

    async fn pledge(repo: &dyn EventRepository) -> Uuid {
        let donation_id = Uuid::new_v4();
        let command = PledgeDonation {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            donation_id,
            gift: Gift::Item {
                name: "Lustrous Gem".into(),
                quantity: 3,
            },
        };
        handle_pledge_donation(&command, &FixedClock(fixed_now()), repo)
            .await
            .unwrap();
        donation_id
    }

    #[tokio::test]
    async fn test_handle_pledge_donation_persists_pledged_event() {
        let repo = RecordingEventRepository::new(Vec::new());

        let donation_id = pledge(&repo).await;

        let writes = repo.appended_writes();
        assert_eq!(writes[0].aggregate_id, donation_id);
        assert_eq!(writes[0].events[0].event_type, DONATION_PLEDGED_EVENT_TYPE);
    }

    #[tokio::test]
    async fn test_handle_approve_donation_by_leader() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let donation_id = pledge(&repo).await;
        let command = ApproveDonation {
            correlation_id: Uuid::new_v4(),
            actor: Actor::guild_leader("9000", "boss"),
            donation_id,
        };

        // Act
        handle_approve_donation(&command, &FixedClock(fixed_now()), &repo, RetryPolicy::default())
            .await
            .unwrap();

        // Assert
        let donation = load_donation(donation_id, &repo).await.unwrap();
        assert_eq!(donation.status(), DonationStatus::Approved);
    }

    #[tokio::test]
    async fn test_handle_reject_donation_after_approval_is_conflict() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let leader = Actor::guild_leader("9000", "boss");
        let donation_id = pledge(&repo).await;
        let approve = ApproveDonation {
            correlation_id: Uuid::new_v4(),
            actor: leader.clone(),
            donation_id,
        };
        handle_approve_donation(&approve, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();
        let reject = RejectDonation {
            correlation_id: Uuid::new_v4(),
            actor: leader,
            donation_id,
            reason: Some("duplicate".into()),
        };

        let result = handle_reject_donation(&reject, &clock, &repo, RetryPolicy::default()).await;

        assert_eq!(result.unwrap_err().conflict_code(), Some("donation_not_pending"));
    }
}
