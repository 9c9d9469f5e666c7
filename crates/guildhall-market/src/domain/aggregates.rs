//! Aggregate roots for the Marketplace context.

use guildhall_core::actor::Actor;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::EventMetadata;
use guildhall_core::identity::{MERCHANT_NAMESPACE, derived_stream_id};
use uuid::Uuid;

use super::events::{
    GoldSold, ItemListed, ListingUpdated, MerchantEvent, MerchantEventKind, MerchantRegistered,
    MerchantRenamed, MerchantStatus, MerchantStatusChanged,
};

/// Returns the stream id of the merchant registered by `discord_id`.
#[must_use]
pub fn merchant_stream_id(discord_id: &str) -> Uuid {
    derived_stream_id(&MERCHANT_NAMESPACE, discord_id)
}

/// The aggregate root for a merchant.
#[derive(Debug)]
pub struct Merchant {
    /// Aggregate identifier, derived from the Discord id.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) discord_id: String,
    pub(crate) discord_name: String,
    pub(crate) gold_available: u64,
    pub(crate) price_per_100: u64,
    pub(crate) advertisement: String,
    pub(crate) status: MerchantStatus,
    pub(crate) registered: bool,
    pub(crate) items: Vec<(String, u64)>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<MerchantEvent>,
}

impl Merchant {
    /// Creates an unregistered merchant for `discord_id`.
    #[must_use]
    pub fn new(discord_id: &str) -> Self {
        Self {
            id: merchant_stream_id(discord_id),
            version: 0,
            discord_id: discord_id.to_owned(),
            discord_name: String::new(),
            gold_available: 0,
            price_per_100: 0,
            advertisement: String::new(),
            status: MerchantStatus::Open,
            registered: false,
            items: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the merchant has registered.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.registered
    }

    /// The merchant's Discord id.
    #[must_use]
    pub fn discord_id(&self) -> &str {
        &self.discord_id
    }

    /// The merchant's display name.
    #[must_use]
    pub fn discord_name(&self) -> &str {
        &self.discord_name
    }

    /// Whether the merchant is trading.
    #[must_use]
    pub fn status(&self) -> MerchantStatus {
        self.status
    }

    /// Gold still on offer.
    #[must_use]
    pub fn gold_available(&self) -> u64 {
        self.gold_available
    }

    fn ensure_owned_by(&self, actor: &Actor) -> Result<(), DomainError> {
        if !self.registered {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        if !actor.is(&self.discord_id) {
            return Err(DomainError::Unauthorized(format!(
                "merchant {} belongs to another user",
                self.discord_id
            )));
        }
        Ok(())
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: MerchantEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = MerchantEvent {
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

    /// Registers the merchant, producing a `MerchantRegistered` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` (`already_registered`) if the user
    /// already has a merchant record.
    pub fn register(
        &mut self,
        discord_name: String,
        gold_available: u64,
        price_per_100: u64,
        advertisement: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.registered {
            return Err(DomainError::conflict(
                "already_registered",
                format!("user {} is already a merchant", self.discord_id),
            ));
        }
        let kind = MerchantEventKind::MerchantRegistered(MerchantRegistered {
            merchant_id: self.discord_id.clone(),
            discord_name,
            gold_available,
            price_per_100,
            advertisement,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Replaces the offer, producing a `ListingUpdated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` or `DomainError::Unauthorized`.
    pub fn update_listing(
        &mut self,
        actor: &Actor,
        gold_available: u64,
        price_per_100: u64,
        advertisement: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_owned_by(actor)?;
        let kind = MerchantEventKind::ListingUpdated(ListingUpdated {
            merchant_id: self.discord_id.clone(),
            gold_available,
            price_per_100,
            advertisement,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Changes the display name, producing a `MerchantRenamed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` or `DomainError::Unauthorized`.
    pub fn rename(
        &mut self,
        actor: &Actor,
        discord_name: String,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_owned_by(actor)?;
        let kind = MerchantEventKind::MerchantRenamed(MerchantRenamed {
            merchant_id: self.discord_id.clone(),
            discord_name,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Opens or closes the merchant. Setting the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` or `DomainError::Unauthorized`.
    pub fn set_status(
        &mut self,
        actor: &Actor,
        status: MerchantStatus,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_owned_by(actor)?;
        if self.status == status {
            return Ok(());
        }
        let kind = MerchantEventKind::MerchantStatusChanged(MerchantStatusChanged {
            merchant_id: self.discord_id.clone(),
            status,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Records a sale of `amount` gold, producing a `GoldSold` event priced
    /// at the current rate.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a zero amount,
    /// `DomainError::Conflict` with `merchant_closed` or `insufficient_gold`,
    /// and the ownership errors of the other mutations.
    pub fn record_gold_sale(
        &mut self,
        actor: &Actor,
        buyer_id: String,
        buyer_name: String,
        amount: u64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_owned_by(actor)?;
        if amount == 0 {
            return Err(DomainError::Validation("amount must be positive".into()));
        }
        if self.status == MerchantStatus::Closed {
            return Err(DomainError::conflict(
                "merchant_closed",
                format!("merchant {} is closed", self.discord_id),
            ));
        }
        if amount > self.gold_available {
            return Err(DomainError::conflict(
                "insufficient_gold",
                format!(
                    "merchant {} has {} gold, sale needs {amount}",
                    self.discord_id, self.gold_available
                ),
            ));
        }
        let price = amount.saturating_mul(self.price_per_100) / 100;
        let kind = MerchantEventKind::GoldSold(GoldSold {
            merchant_id: self.discord_id.clone(),
            buyer_id,
            buyer_name,
            amount,
            price,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    /// Lists an item, producing an `ItemListed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty item name and the
    /// ownership errors of the other mutations.
    pub fn list_item(
        &mut self,
        actor: &Actor,
        item_name: String,
        price: u64,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_owned_by(actor)?;
        if item_name.trim().is_empty() {
            return Err(DomainError::Validation("item name must not be empty".into()));
        }
        let kind = MerchantEventKind::ItemListed(ItemListed {
            merchant_id: self.discord_id.clone(),
            item_name,
            price,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }
}

impl AggregateRoot for Merchant {
    type Event = MerchantEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            MerchantEventKind::MerchantRegistered(payload) => {
                self.registered = true;
                self.discord_id.clone_from(&payload.merchant_id);
                self.discord_name.clone_from(&payload.discord_name);
                self.gold_available = payload.gold_available;
                self.price_per_100 = payload.price_per_100;
                self.advertisement.clone_from(&payload.advertisement);
                self.status = MerchantStatus::Open;
            }
            MerchantEventKind::ListingUpdated(payload) => {
                self.gold_available = payload.gold_available;
                self.price_per_100 = payload.price_per_100;
                self.advertisement.clone_from(&payload.advertisement);
            }
            MerchantEventKind::MerchantRenamed(payload) => {
                self.discord_name.clone_from(&payload.discord_name);
            }
            MerchantEventKind::MerchantStatusChanged(payload) => {
                self.status = payload.status;
            }
            MerchantEventKind::GoldSold(payload) => {
                self.gold_available = self.gold_available.saturating_sub(payload.amount);
            }
            MerchantEventKind::ItemListed(payload) => {
                self.items.push((payload.item_name.clone(), payload.price));
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

#[cfg(test)]
mod tests {
    use guildhall_test_support::{FixedClock, fixed_now};

    use super::*;

    fn registered(discord_id: &str, gold: u64, price_per_100: u64) -> Merchant {
        let clock = FixedClock(fixed_now());
        let mut merchant = Merchant::new(discord_id);
        merchant
            .register("Goldie".into(), gold, price_per_100, "cheap gold".into(), Uuid::new_v4(), &clock)
            .unwrap();
        let events = merchant.uncommitted_events().to_vec();
        for event in &events {
            merchant.apply(event);
        }
        merchant.clear_uncommitted_events();
        merchant
    }

    #[test]
    fn test_register_twice_is_already_registered() {
        let clock = FixedClock(fixed_now());
        let mut merchant = registered("4004", 1_000, 50);

        let result = merchant.register("Again".into(), 1, 1, String::new(), Uuid::new_v4(), &clock);

        assert_eq!(result.unwrap_err().conflict_code(), Some("already_registered"));
    }

    #[test]
    fn test_gold_sale_is_priced_per_hundred_and_reduces_stock() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let owner = Actor::member("4004", "goldie");
        let mut merchant = registered("4004", 1_000, 50);

        // Act
        merchant
            .record_gold_sale(&owner, "1001".into(), "aster".into(), 400, Uuid::new_v4(), &clock)
            .unwrap();

        // Assert
        let event = merchant.uncommitted_events()[0].clone();
        match &event.kind {
            MerchantEventKind::GoldSold(sold) => {
                assert_eq!(sold.amount, 400);
                assert_eq!(sold.price, 200);
            }
            other => panic!("expected GoldSold, got {other:?}"),
        }
        merchant.apply(&event);
        assert_eq!(merchant.gold_available(), 600);
    }

    #[test]
    fn test_gold_sale_beyond_stock_is_rejected() {
        let clock = FixedClock(fixed_now());
        let owner = Actor::member("4004", "goldie");
        let mut merchant = registered("4004", 100, 50);

        let result =
            merchant.record_gold_sale(&owner, "1001".into(), "aster".into(), 101, Uuid::new_v4(), &clock);

        assert_eq!(result.unwrap_err().conflict_code(), Some("insufficient_gold"));
        assert!(merchant.uncommitted_events().is_empty());
    }

    #[test]
    fn test_closed_merchant_cannot_sell() {
        let clock = FixedClock(fixed_now());
        let owner = Actor::member("4004", "goldie");
        let mut merchant = registered("4004", 100, 50);
        merchant.status = MerchantStatus::Closed;

        let result =
            merchant.record_gold_sale(&owner, "1001".into(), "aster".into(), 10, Uuid::new_v4(), &clock);

        assert_eq!(result.unwrap_err().conflict_code(), Some("merchant_closed"));
    }

    #[test]
    fn test_only_the_merchant_may_rename() {
        let clock = FixedClock(fixed_now());
        let mut merchant = registered("4004", 100, 50);

        let result = merchant.rename(
            &Actor::guild_leader("9999", "boss"),
            "Hijacked".into(),
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_setting_current_status_records_nothing() {
        let clock = FixedClock(fixed_now());
        let owner = Actor::member("4004", "goldie");
        let mut merchant = registered("4004", 100, 50);

        merchant
            .set_status(&owner, MerchantStatus::Open, Uuid::new_v4(), &clock)
            .unwrap();

        assert!(merchant.uncommitted_events().is_empty());
    }
}
