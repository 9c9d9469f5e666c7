//! Commands for the Marketplace context.
//!
//! Merchants are addressed by the acting user's Discord id; nobody mutates
//! another user's merchant record.

use guildhall_core::actor::Actor;
use uuid::Uuid;

use super::events::MerchantStatus;

/// Command to register the actor as a merchant.
#[derive(Debug, Clone)]
pub struct RegisterMerchant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The registering user.
    pub actor: Actor,
    /// Display name.
    pub discord_name: String,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price per hundred gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    pub advertisement: String,
}

/// Command to replace the actor's offer.
#[derive(Debug, Clone)]
pub struct UpdateListing {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The merchant.
    pub actor: Actor,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price per hundred gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    pub advertisement: String,
}

/// Command to change the actor's merchant display name.
#[derive(Debug, Clone)]
pub struct RenameMerchant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The merchant.
    pub actor: Actor,
    /// New display name.
    pub discord_name: String,
}

/// Command to open or close the actor's merchant.
#[derive(Debug, Clone)]
pub struct SetMerchantStatus {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The merchant.
    pub actor: Actor,
    /// New status.
    pub status: MerchantStatus,
}

/// Command to record a gold sale.
#[derive(Debug, Clone)]
pub struct RecordGoldSale {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The merchant.
    pub actor: Actor,
    /// The buyer's Discord id.
    pub buyer_id: String,
    /// The buyer's name.
    pub buyer_name: String,
    /// Gold sold.
    pub amount: u64,
}

/// Command to list an item.
#[derive(Debug, Clone)]
pub struct ListItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The merchant.
    pub actor: Actor,
    /// Item name.
    pub item_name: String,
    /// Asking price.
    pub price: u64,
}

guildhall_core::impl_command! {
    RegisterMerchant => "market.register_merchant",
    UpdateListing => "market.update_listing",
    RenameMerchant => "market.rename_merchant",
    SetMerchantStatus => "market.set_merchant_status",
    RecordGoldSale => "market.record_gold_sale",
    ListItem => "market.list_item",
}
