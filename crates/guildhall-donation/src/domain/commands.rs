//! Commands for the Donations context.

use guildhall_core::actor::Actor;
use uuid::Uuid;

use super::events::Gift;

/// Command to pledge a donation; the actor becomes the donor.
#[derive(Debug, Clone)]
pub struct PledgeDonation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The donor.
    pub actor: Actor,
    /// The new donation's identifier.
    pub donation_id: Uuid,
    /// The gift.
    pub gift: Gift,
}

/// Command to accept a pending donation.
#[derive(Debug, Clone)]
pub struct ApproveDonation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The reviewing guild leader.
    pub actor: Actor,
    /// The donation identifier.
    pub donation_id: Uuid,
}

/// Command to decline a pending donation.
#[derive(Debug, Clone)]
pub struct RejectDonation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The reviewing guild leader.
    pub actor: Actor,
    /// The donation identifier.
    pub donation_id: Uuid,
    /// Optional reason shown to the donor.
    pub reason: Option<String>,
}

guildhall_core::impl_command! {
    PledgeDonation => "donation.pledge_donation",
    ApproveDonation => "donation.approve_donation",
    RejectDonation => "donation.reject_donation",
}
