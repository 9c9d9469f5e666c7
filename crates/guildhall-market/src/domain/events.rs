//! Domain events for the Marketplace context.

use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};

/// Event type for `MerchantRegistered`.
pub const MERCHANT_REGISTERED_EVENT_TYPE: &str = "merchant.registered";
/// Event type for `ListingUpdated`.
pub const LISTING_UPDATED_EVENT_TYPE: &str = "merchant.listing_updated";
/// Event type for `MerchantRenamed`.
pub const MERCHANT_RENAMED_EVENT_TYPE: &str = "merchant.renamed";
/// Event type for `MerchantStatusChanged`.
pub const MERCHANT_STATUS_CHANGED_EVENT_TYPE: &str = "merchant.status_changed";
/// Event type for `GoldSold`.
pub const GOLD_SOLD_EVENT_TYPE: &str = "merchant.gold_sold";
/// Event type for `ItemListed`.
pub const ITEM_LISTED_EVENT_TYPE: &str = "merchant.item_listed";

/// Whether a merchant is currently trading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantStatus {
    /// Accepting buyers.
    #[default]
    Open,
    /// Not trading.
    Closed,
}

/// Emitted when a user registers as a merchant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRegistered {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// Display name shown in the marketplace.
    pub discord_name: String,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price charged per hundred gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    pub advertisement: String,
}

/// Emitted when a merchant changes its offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingUpdated {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price charged per hundred gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    pub advertisement: String,
}

/// Emitted when a merchant changes its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantRenamed {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// New display name.
    pub discord_name: String,
}

/// Emitted when a merchant opens or closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantStatusChanged {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// New status.
    pub status: MerchantStatus,
}

/// Emitted when a merchant sells gold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldSold {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// The buyer's Discord id.
    pub buyer_id: String,
    /// The buyer's name at the time of sale.
    pub buyer_name: String,
    /// Gold sold.
    pub amount: u64,
    /// Total price charged.
    pub price: u64,
}

/// Emitted when a merchant lists an item for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListed {
    /// The merchant's Discord id.
    pub merchant_id: String,
    /// Item name.
    pub item_name: String,
    /// Asking price.
    pub price: u64,
}

/// Event payload variants for the Marketplace context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MerchantEventKind {
    /// A merchant registered.
    MerchantRegistered(MerchantRegistered),
    /// The offer changed.
    ListingUpdated(ListingUpdated),
    /// The display name changed.
    MerchantRenamed(MerchantRenamed),
    /// The merchant opened or closed.
    MerchantStatusChanged(MerchantStatusChanged),
    /// Gold was sold.
    GoldSold(GoldSold),
    /// An item was listed.
    ItemListed(ItemListed),
}

impl MerchantEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MerchantRegistered(_) => MERCHANT_REGISTERED_EVENT_TYPE,
            Self::ListingUpdated(_) => LISTING_UPDATED_EVENT_TYPE,
            Self::MerchantRenamed(_) => MERCHANT_RENAMED_EVENT_TYPE,
            Self::MerchantStatusChanged(_) => MERCHANT_STATUS_CHANGED_EVENT_TYPE,
            Self::GoldSold(_) => GOLD_SOLD_EVENT_TYPE,
            Self::ItemListed(_) => ITEM_LISTED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Marketplace context.
#[derive(Debug, Clone)]
pub struct MerchantEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: MerchantEventKind,
}

impl DomainEvent for MerchantEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("MerchantEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
