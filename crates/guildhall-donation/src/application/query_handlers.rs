//! Query handlers for the Donations context.

use chrono::{DateTime, Utc};
use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, streams_with_prefix};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_donation, reconstitute};
use crate::domain::aggregates::Donation;
use crate::domain::events::{DonationStatus, Donor, Gift};

/// Read-only view of a donation aggregate.
#[derive(Debug, Serialize)]
pub struct DonationView {
    /// The donation identifier.
    pub donation_id: Uuid,
    /// Donor.
    pub donor: Option<Donor>,
    /// The gift.
    pub gift: Option<Gift>,
    /// Review state.
    pub status: DonationStatus,
    /// Reviewing leader.
    pub decided_by: Option<String>,
    /// Rejection reason.
    pub reason: Option<String>,
    /// When the pledge was made.
    pub pledged_at: Option<DateTime<Utc>>,
    /// When it was reviewed.
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<&Donation> for DonationView {
    fn from(donation: &Donation) -> Self {
        Self {
            donation_id: donation.id,
            donor: donation.donor.clone(),
            gift: donation.gift.clone(),
            status: donation.status,
            decided_by: donation.decided_by.clone(),
            reason: donation.reason.clone(),
            pledged_at: donation.pledged_at,
            decided_at: donation.decided_at,
        }
    }
}

/// Retrieves a donation by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
pub async fn get_donation(
    donation_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<DonationView, DomainError> {
    let donation = load_donation(donation_id, repo).await?;
    Ok(DonationView::from(&donation))
}

/// Lists donations in pledge order, optionally only those with `status`.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_donations(
    status: Option<DonationStatus>,
    repo: &dyn EventRepository,
) -> Result<Vec<DonationView>, DomainError> {
    let all_events = repo.load_all_events().await?;
    let mut views = Vec::new();
    for (donation_id, events) in streams_with_prefix(&all_events, "donation.") {
        let donation = reconstitute(donation_id, &events)?;
        if status.is_none_or(|wanted| donation.status() == wanted) {
            views.push(DonationView::from(&donation));
        }
    }
    Ok(views)
}
