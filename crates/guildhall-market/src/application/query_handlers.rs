//! Query handlers for the Marketplace context.

use guildhall_core::error::DomainError;
use guildhall_core::event::decode_payload;
use guildhall_core::repository::{EventRepository, streams_with_prefix};
use serde::Serialize;

use crate::application::command_handlers::{load_registered_merchant, reconstitute};
use crate::domain::aggregates::Merchant;
use crate::domain::events::{MerchantEventKind, MerchantStatus};

/// An item a merchant has listed.
#[derive(Debug, Serialize)]
pub struct ItemView {
    /// Item name.
    pub item_name: String,
    /// Asking price.
    pub price: u64,
}

/// Read-only view of a merchant aggregate.
#[derive(Debug, Serialize)]
pub struct MerchantView {
    /// The merchant's Discord id.
    pub discord_id: String,
    /// Display name.
    pub discord_name: String,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price per hundred gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    pub advertisement: String,
    /// Trading status.
    pub status: MerchantStatus,
    /// Listed items, oldest first.
    pub items: Vec<ItemView>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Merchant> for MerchantView {
    fn from(merchant: &Merchant) -> Self {
        Self {
            discord_id: merchant.discord_id.clone(),
            discord_name: merchant.discord_name.clone(),
            gold_available: merchant.gold_available,
            price_per_100: merchant.price_per_100,
            advertisement: merchant.advertisement.clone(),
            status: merchant.status,
            items: merchant
                .items
                .iter()
                .map(|(item_name, price)| ItemView {
                    item_name: item_name.clone(),
                    price: *price,
                })
                .collect(),
            version: merchant.version,
        }
    }
}

/// Retrieves the merchant registered by `discord_id`.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the user never registered.
pub async fn get_merchant(
    discord_id: &str,
    repo: &dyn EventRepository,
) -> Result<MerchantView, DomainError> {
    let merchant = load_registered_merchant(discord_id, repo).await?;
    Ok(MerchantView::from(&merchant))
}

/// Lists merchants in registration order, optionally only those with
/// `status`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_merchants(
    status: Option<MerchantStatus>,
    repo: &dyn EventRepository,
) -> Result<Vec<MerchantView>, DomainError> {
    let all_events = repo.load_all_events().await?;
    let mut views = Vec::new();
    for (_, events) in streams_with_prefix(&all_events, "merchant.") {
        let Some(first) = events.first() else {
            continue;
        };
        let MerchantEventKind::MerchantRegistered(registered) = decode_payload::<MerchantEventKind>(first)? else {
            continue;
        };
        let merchant = reconstitute(&registered.merchant_id, &events)?;
        if status.is_none_or(|wanted| merchant.status() == wanted) {
            views.push(MerchantView::from(&merchant));
        }
    }
    Ok(views)
}
