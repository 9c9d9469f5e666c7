//! Domain events for the Loan context.

use chrono::{DateTime, Utc};
use guildhall_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::{LoanAction, LoanStatus};

/// Event type for `LoanRequested`.
pub const LOAN_REQUESTED_EVENT_TYPE: &str = "loan.requested";
/// Event type for `LoanTransitioned`.
pub const LOAN_TRANSITIONED_EVENT_TYPE: &str = "loan.transitioned";

/// Who lends the gold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoanSource {
    /// The guild bank; guild leaders decide.
    Guild {
        /// Guild name.
        guild: String,
    },
    /// A registered merchant; the merchant decides.
    Merchant {
        /// The merchant's Discord id.
        merchant_id: String,
    },
}

/// The borrowing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    /// Discord id.
    pub discord_id: String,
    /// Name at request time.
    pub name: String,
}

/// The user who took a lifecycle step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepActor {
    /// User id.
    pub user_id: String,
    /// Name at the time of the step.
    pub display_name: String,
}

/// Emitted when a member asks for a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequested {
    /// The loan identifier.
    pub loan_id: Uuid,
    /// Gold requested.
    pub amount: u64,
    /// Lender.
    pub source: LoanSource,
    /// Borrower.
    pub borrower: Borrower,
    /// Optional repayment deadline.
    pub due_date: Option<DateTime<Utc>>,
}

/// Emitted on every lifecycle step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTransitioned {
    /// The loan identifier.
    pub loan_id: Uuid,
    /// Status before the step.
    pub from: LoanStatus,
    /// Status after the step.
    pub to: LoanStatus,
    /// The step taken.
    pub action: LoanAction,
    /// Who took it.
    pub actor: StepActor,
}

/// Event payload variants for the Loan context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoanEventKind {
    /// A loan was requested.
    LoanRequested(LoanRequested),
    /// A lifecycle step was taken.
    LoanTransitioned(LoanTransitioned),
}

impl LoanEventKind {
    /// Returns the event type name for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::LoanRequested(_) => LOAN_REQUESTED_EVENT_TYPE,
            Self::LoanTransitioned(_) => LOAN_TRANSITIONED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Loan context.
#[derive(Debug, Clone)]
pub struct LoanEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: LoanEventKind,
}

impl DomainEvent for LoanEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("LoanEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
