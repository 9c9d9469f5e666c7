//! Domain events for the Donations context.

use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type for `DonationPledged`.
pub const DONATION_PLEDGED_EVENT_TYPE: &str = "donation.pledged";
/// Event type for `DonationApproved`.
pub const DONATION_APPROVED_EVENT_TYPE: &str = "donation.approved";
/// Event type for `DonationRejected`.
pub const DONATION_REJECTED_EVENT_TYPE: &str = "donation.rejected";

/// What is being donated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gift {
    /// Gold.
    Gold {
        /// Gold amount.
        amount: u64,
    },
    /// An in-game item.
    Item {
        /// Item name.
        name: String,
        /// How many.
        quantity: u32,
    },
}

/// Review state of a donation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Awaiting a guild leader.
    #[default]
    Pending,
    /// Accepted into the guild bank.
    Approved,
    /// Declined.
    Rejected,
}

/// The donating user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    /// Discord id.
    pub discord_id: String,
    /// Name at pledge time.
    pub name: String,
}

/// Emitted when a member pledges a donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationPledged {
    /// The donation identifier.
    pub donation_id: Uuid,
    /// Donor.
    pub donor: Donor,
    /// The gift.
    pub gift: Gift,
}

/// Emitted when a guild leader accepts a donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationApproved {
    /// The donation identifier.
    pub donation_id: Uuid,
    /// Deciding leader's id.
    pub decided_by: String,
}

/// Emitted when a guild leader declines a donation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationRejected {
    /// The donation identifier.
    pub donation_id: Uuid,
    /// Deciding leader's id.
    pub decided_by: String,
    /// Optional reason.
    pub reason: Option<String>,
}

/// Event payload variants for the Donations context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DonationEventKind {
    /// A pledge was made.
    DonationPledged(DonationPledged),
    /// A pledge was approved.
    DonationApproved(DonationApproved),
    /// A pledge was rejected.
    DonationRejected(DonationRejected),
}

impl DonationEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DonationPledged(_) => DONATION_PLEDGED_EVENT_TYPE,
            Self::DonationApproved(_) => DONATION_APPROVED_EVENT_TYPE,
            Self::DonationRejected(_) => DONATION_REJECTED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Donations context.
#[derive(Debug, Clone)]
pub struct DonationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: DonationEventKind,
}

impl DomainEvent for DonationEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("DonationEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
