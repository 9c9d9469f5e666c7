//! The loan lifecycle.
//!
//! ```text
//! waitingApproval --approve--> active --markReturned--> returned --confirmCompleted--> completed
//!        \--reject--> rejected
//! ```
//!
//! `completed` and `rejected` are terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a loan is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanStatus {
    /// Requested, awaiting the lender.
    #[default]
    WaitingApproval,
    /// Gold handed over.
    Active,
    /// Borrower says the gold is back.
    Returned,
    /// Lender confirmed the repayment.
    Completed,
    /// Lender declined.
    Rejected,
}

impl LoanStatus {
    /// The wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingApproval => "waitingApproval",
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether no further step is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoanAction {
    /// Lender accepts the request.
    Approve,
    /// Lender declines the request.
    Reject,
    /// Borrower reports repayment.
    MarkReturned,
    /// Lender confirms repayment.
    ConfirmCompleted,
}

impl LoanAction {
    /// The wire name of the action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::MarkReturned => "markReturned",
            Self::ConfirmCompleted => "confirmCompleted",
        }
    }
}

impl fmt::Display for LoanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which party to the loan may take a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The guild leaders or the merchant.
    Lender,
    /// The borrower.
    Borrower,
}

/// Every legal step: (from, action, to, side).
pub const TRANSITIONS: [(LoanStatus, LoanAction, LoanStatus, Side); 4] = [
    (LoanStatus::WaitingApproval, LoanAction::Approve, LoanStatus::Active, Side::Lender),
    (LoanStatus::WaitingApproval, LoanAction::Reject, LoanStatus::Rejected, Side::Lender),
    (LoanStatus::Active, LoanAction::MarkReturned, LoanStatus::Returned, Side::Borrower),
    (LoanStatus::Returned, LoanAction::ConfirmCompleted, LoanStatus::Completed, Side::Lender),
];

/// Looks up the step `action` from `from`. Returns the target status and the
/// side allowed to take it, or `None` if the step is illegal.
#[must_use]
pub fn next(from: LoanStatus, action: LoanAction) -> Option<(LoanStatus, Side)> {
    TRANSITIONS
        .iter()
        .find(|(f, a, _, _)| *f == from && *a == action)
        .map(|(_, _, to, side)| (*to, *side))
}
