//! Query handlers for the Loan context.

use chrono::{DateTime, Utc};
use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, streams_with_prefix};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_loan, reconstitute};
use crate::domain::aggregates::Loan;
use crate::domain::events::{Borrower, LoanSource};
use crate::domain::lifecycle::LoanStatus;

/// Read-only view of a loan aggregate.
#[derive(Debug, Serialize)]
pub struct LoanView {
    /// The loan identifier.
    pub loan_id: Uuid,
    /// Gold lent.
    pub amount: u64,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// Lender.
    pub source: Option<LoanSource>,
    /// Borrower.
    pub borrower: Option<Borrower>,
    /// When the loan was requested.
    pub created_at: Option<DateTime<Utc>>,
    /// When the last step was taken.
    pub updated_at: Option<DateTime<Utc>>,
    /// Optional repayment deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Loan> for LoanView {
    fn from(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id,
            amount: loan.amount,
            status: loan.status,
            source: loan.source.clone(),
            borrower: loan.borrower.clone(),
            created_at: loan.created_at,
            updated_at: loan.updated_at,
            due_date: loan.due_date,
            version: loan.version,
        }
    }
}

/// Retrieves a loan by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID.
pub async fn get_loan(loan_id: Uuid, repo: &dyn EventRepository) -> Result<LoanView, DomainError> {
    let loan = load_loan(loan_id, repo).await?;
    Ok(LoanView::from(&loan))
}

/// Lists loans in request order, optionally for one borrower.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn list_loans(
    borrower_id: Option<&str>,
    repo: &dyn EventRepository,
) -> Result<Vec<LoanView>, DomainError> {
    let all_events = repo.load_all_events().await?;
    let mut views = Vec::new();
    for (loan_id, events) in streams_with_prefix(&all_events, "loan.") {
        let loan = reconstitute(loan_id, &events)?;
        let matches = borrower_id.is_none_or(|wanted| {
            loan.borrower().is_some_and(|b| b.discord_id == wanted)
        });
        if matches {
            views.push(LoanView::from(&loan));
        }
    }
    Ok(views)
}
