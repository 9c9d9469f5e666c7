//! Command handlers for the Marketplace context.

use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent};
use guildhall_core::retry::{RetryPolicy, retry_on_conflict};
use tracing::debug;

use crate::domain::aggregates::Merchant;
use crate::domain::commands::{
    ListItem, RecordGoldSale, RegisterMerchant, RenameMerchant, SetMerchantStatus, UpdateListing,
};
use crate::domain::events::{MerchantEvent, MerchantEventKind};

/// Reconstitutes the merchant of `discord_id` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    discord_id: &str,
    existing_events: &[StoredEvent],
) -> Result<Merchant, DomainError> {
    let mut merchant = Merchant::new(discord_id);
    for stored in existing_events {
        let kind: MerchantEventKind = decode_payload(stored)?;
        merchant.apply(&MerchantEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(merchant)
}

/// Loads the merchant of `discord_id`, registered or not.
///
/// # Errors
///
/// Returns `DomainError` if loading or deserialization fails.
pub async fn load_merchant(
    discord_id: &str,
    repo: &dyn EventRepository,
) -> Result<Merchant, DomainError> {
    let stream_id = Merchant::new(discord_id).id;
    let existing_events = repo.load_events(stream_id).await?;
    reconstitute(discord_id, &existing_events)
}

/// Loads a registered merchant.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if `discord_id` never registered.
pub async fn load_registered_merchant(
    discord_id: &str,
    repo: &dyn EventRepository,
) -> Result<Merchant, DomainError> {
    let merchant = load_merchant(discord_id, repo).await?;
    if !merchant.exists() {
        return Err(DomainError::AggregateNotFound(merchant.id));
    }
    Ok(merchant)
}

async fn persist(
    merchant: &Merchant,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = merchant
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();
    if stored_events.is_empty() {
        return Ok(stored_events);
    }

    repo.append_events(merchant.id, merchant.version(), &stored_events)
        .await?;
    debug!(merchant = %merchant.discord_id(), count = stored_events.len(), "merchant events persisted");

    Ok(stored_events)
}

/// Handles the `RegisterMerchant` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty name and
/// `DomainError::Conflict` (`already_registered`) on a second registration.
pub async fn handle_register_merchant(
    command: &RegisterMerchant,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    if command.discord_name.trim().is_empty() {
        return Err(DomainError::Validation("merchant name must not be empty".into()));
    }
    let mut merchant = load_merchant(&command.actor.user_id, repo).await?;
    merchant.register(
        command.discord_name.trim().to_owned(),
        command.gold_available,
        command.price_per_100,
        command.advertisement.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&merchant, repo).await
}

/// Handles the `UpdateListing` command.
///
/// # Errors
///
/// Returns `DomainError` if loading or appending fails.
pub async fn handle_update_listing(
    command: &UpdateListing,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut merchant = load_registered_merchant(&command.actor.user_id, repo).await?;
    merchant.update_listing(
        &command.actor,
        command.gold_available,
        command.price_per_100,
        command.advertisement.clone(),
        command.correlation_id,
        clock,
    )?;

    persist(&merchant, repo).await
}

/// Handles the `RenameMerchant` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty name and `DomainError` if
/// loading or appending fails.
pub async fn handle_rename_merchant(
    command: &RenameMerchant,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    if command.discord_name.trim().is_empty() {
        return Err(DomainError::Validation("merchant name must not be empty".into()));
    }
    let mut merchant = load_registered_merchant(&command.actor.user_id, repo).await?;
    merchant.rename(
        &command.actor,
        command.discord_name.trim().to_owned(),
        command.correlation_id,
        clock,
    )?;

    persist(&merchant, repo).await
}

/// Handles the `SetMerchantStatus` command.
///
/// # Errors
///
/// Returns `DomainError` if loading or appending fails.
pub async fn handle_set_merchant_status(
    command: &SetMerchantStatus,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut merchant = load_registered_merchant(&command.actor.user_id, repo).await?;
    merchant.set_status(&command.actor, command.status, command.correlation_id, clock)?;

    persist(&merchant, repo).await
}

async fn gold_sale_once(
    command: &RecordGoldSale,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut merchant = load_registered_merchant(&command.actor.user_id, repo).await?;
    merchant.record_gold_sale(
        &command.actor,
        command.buyer_id.clone(),
        command.buyer_name.clone(),
        command.amount,
        command.correlation_id,
        clock,
    )?;

    persist(&merchant, repo).await
}

/// Handles the `RecordGoldSale` command. The stock check is retried against
/// fresh state when another write to the merchant lands first.
///
/// # Errors
///
/// Returns `DomainError::Conflict` with `merchant_closed` or
/// `insufficient_gold`, and `DomainError` if loading or appending fails.
pub async fn handle_record_gold_sale(
    command: &RecordGoldSale,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || gold_sale_once(command, clock, repo)).await
}

/// Handles the `ListItem` command.
///
/// # Errors
///
/// Returns `DomainError` if validation, loading or appending fails.
pub async fn handle_list_item(
    command: &ListItem,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut merchant = load_registered_merchant(&command.actor.user_id, repo).await?;
    merchant.list_item(
        &command.actor,
        command.item_name.trim().to_owned(),
        command.price,
        command.correlation_id,
        clock,
    )?;

    persist(&merchant, repo).await
}

#[cfg(test)]
mod tests {
    use guildhall_core::actor::Actor;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, RecordingEventRepository,
        fixed_now,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::aggregates::merchant_stream_id;
    use crate::domain::events::{GOLD_SOLD_EVENT_TYPE, MERCHANT_REGISTERED_EVENT_TYPE};

    fn register_command(actor: &Actor) -> RegisterMerchant {
        RegisterMerchant {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            discord_name: " Goldie ".into(),
            gold_available: 1_000,
            price_per_100: 50,
            advertisement: "fast delivery".into(),
        }
    }

    #[tokio::test]
    async fn test_handle_register_merchant_writes_to_derived_stream() {
        // Arrange
        let actor = Actor::member("4004", "goldie");
        let repo = RecordingEventRepository::new(Vec::new());

        // Act
        handle_register_merchant(&register_command(&actor), &FixedClock(fixed_now()), &repo)
            .await
            .unwrap();

        // Assert
        let writes = repo.appended_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].aggregate_id, merchant_stream_id("4004"));
        assert_eq!(writes[0].expected_version, 0);
        assert_eq!(writes[0].events[0].event_type, MERCHANT_REGISTERED_EVENT_TYPE);
    }

    #[tokio::test]
    async fn test_handle_register_merchant_twice_is_already_registered() {
        let actor = Actor::member("4004", "goldie");
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        handle_register_merchant(&register_command(&actor), &clock, &repo)
            .await
            .unwrap();

        let result = handle_register_merchant(&register_command(&actor), &clock, &repo).await;

        assert_eq!(result.unwrap_err().conflict_code(), Some("already_registered"));
    }

    #[tokio::test]
    async fn test_handle_record_gold_sale_reduces_stock() {
        // Arrange
        let actor = Actor::member("4004", "goldie");
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        handle_register_merchant(&register_command(&actor), &clock, &repo)
            .await
            .unwrap();
        let command = RecordGoldSale {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            buyer_id: "1001".into(),
            buyer_name: "aster".into(),
            amount: 300,
        };

        // Act
        let stored = handle_record_gold_sale(&command, &clock, &repo, RetryPolicy::default())
            .await
            .unwrap();

        // Assert
        assert_eq!(stored[0].event_type, GOLD_SOLD_EVENT_TYPE);
        let merchant = load_registered_merchant("4004", &repo).await.unwrap();
        assert_eq!(merchant.gold_available(), 700);
    }

    #[tokio::test]
    async fn test_handle_rename_merchant_for_unregistered_user_is_not_found() {
        let command = RenameMerchant {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("4004", "goldie"),
            discord_name: "Goldie".into(),
        };

        let result =
            handle_rename_merchant(&command, &FixedClock(fixed_now()), &EmptyEventRepository).await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, merchant_stream_id("4004")),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handle_list_item_propagates_infrastructure_errors() {
        let command = ListItem {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("4004", "goldie"),
            item_name: "Ancient Goggles".into(),
            price: 500,
        };

        let result =
            handle_list_item(&command, &FixedClock(fixed_now()), &FailingEventRepository).await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
