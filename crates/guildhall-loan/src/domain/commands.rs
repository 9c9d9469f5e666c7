//! Commands for the Loan context.

use chrono::{DateTime, Utc};
use guildhall_core::actor::Actor;
use uuid::Uuid;

use super::events::LoanSource;
use super::lifecycle::LoanAction;

/// Command to request a loan; the actor becomes the borrower.
#[derive(Debug, Clone)]
pub struct RequestLoan {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The borrower.
    pub actor: Actor,
    /// The new loan's identifier.
    pub loan_id: Uuid,
    /// Gold requested.
    pub amount: u64,
    /// Lender.
    pub source: LoanSource,
    /// Optional repayment deadline.
    pub due_date: Option<DateTime<Utc>>,
}

/// Command to take a lifecycle step on a loan.
#[derive(Debug, Clone)]
pub struct TransitionLoan {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The lender or borrower taking the step.
    pub actor: Actor,
    /// The loan identifier.
    pub loan_id: Uuid,
    /// The step.
    pub action: LoanAction,
}

guildhall_core::impl_command! {
    RequestLoan => "loan.request_loan",
    TransitionLoan => "loan.transition_loan",
}
