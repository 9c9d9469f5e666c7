//! Aggregate roots for the Loan context.

use chrono::{DateTime, Utc};
use guildhall_core::actor::Actor;
use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    Borrower, LoanEvent, LoanEventKind, LoanRequested, LoanSource, LoanTransitioned, StepActor,
};
use super::lifecycle::{self, LoanAction, LoanStatus, Side};

/// Conflict code for a step the lifecycle does not allow.
pub const INVALID_TRANSITION: &str = "invalid_transition";

/// The aggregate root for a loan.
#[derive(Debug)]
pub struct Loan {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    pub(crate) amount: u64,
    pub(crate) status: LoanStatus,
    pub(crate) source: Option<LoanSource>,
    pub(crate) borrower: Option<Borrower>,
    pub(crate) created_at: Option<DateTime<Utc>>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
    pub(crate) due_date: Option<DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<LoanEvent>,
}

impl Loan {
    /// Creates a new, empty loan.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            amount: 0,
            status: LoanStatus::WaitingApproval,
            source: None,
            borrower: None,
            created_at: None,
            updated_at: None,
            due_date: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the loan has been requested.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.borrower.is_some()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> LoanStatus {
        self.status
    }

    /// The borrower, once requested.
    #[must_use]
    pub fn borrower(&self) -> Option<&Borrower> {
        self.borrower.as_ref()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: LoanEventKind, correlation_id: Uuid, clock: &dyn Clock) {
        let event = LoanEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: kind.event_type().to_owned(),
                aggregate_id: self.id,
                sequence_number: self.next_sequence_number(),
                correlation_id,
                causation_id: correlation_id,
                occurred_at: clock.now(),
            },
            kind,
        };
        self.uncommitted_events.push(event);
    }

    /// Requests the loan for `actor`, producing a `LoanRequested` event.
    ///
    /// Merchant existence is checked by the caller, which has the store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a zero amount, an empty guild
    /// name or a due date in the past, and `DomainError::Conflict`
    /// (`loan_exists`) if the id is taken.
    pub fn request(
        &mut self,
        actor: &Actor,
        amount: u64,
        source: LoanSource,
        due_date: Option<DateTime<Utc>>,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.exists() {
            return Err(DomainError::conflict(
                "loan_exists",
                format!("loan {} already exists", self.id),
            ));
        }
        if amount == 0 {
            return Err(DomainError::Validation("amount must be positive".into()));
        }
        if matches!(&source, LoanSource::Guild { guild } if guild.trim().is_empty()) {
            return Err(DomainError::Validation("guild must not be empty".into()));
        }
        if due_date.is_some_and(|due| due < clock.now()) {
            return Err(DomainError::Validation("due date is in the past".into()));
        }

        let kind = LoanEventKind::LoanRequested(LoanRequested {
            loan_id: self.id,
            amount,
            source,
            borrower: Borrower {
                discord_id: actor.user_id.clone(),
                name: actor.display_name.clone(),
            },
            due_date,
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }

    fn is_on_side(&self, actor: &Actor, side: Side) -> bool {
        match side {
            Side::Borrower => self
                .borrower
                .as_ref()
                .is_some_and(|b| actor.is(&b.discord_id)),
            Side::Lender => match &self.source {
                Some(LoanSource::Guild { .. }) => actor.is_guild_leader,
                Some(LoanSource::Merchant { merchant_id }) => actor.is(merchant_id),
                None => false,
            },
        }
    }

    /// Takes lifecycle step `action`, producing a `LoanTransitioned` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the loan does not exist,
    /// `DomainError::Conflict` (`invalid_transition`) if the step is not
    /// legal from the current status, and `DomainError::Unauthorized` if the
    /// actor is on the wrong side of the loan.
    pub fn transition(
        &mut self,
        actor: &Actor,
        action: LoanAction,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.exists() {
            return Err(DomainError::AggregateNotFound(self.id));
        }
        let from = self.status;
        let Some((to, side)) = lifecycle::next(from, action) else {
            return Err(DomainError::conflict(
                INVALID_TRANSITION,
                format!("cannot {action} loan {} while {from}", self.id),
            ));
        };
        if !self.is_on_side(actor, side) {
            let who = match side {
                Side::Lender => "the lender",
                Side::Borrower => "the borrower",
            };
            return Err(DomainError::Unauthorized(format!(
                "only {who} may {action} loan {}",
                self.id
            )));
        }

        let kind = LoanEventKind::LoanTransitioned(LoanTransitioned {
            loan_id: self.id,
            from,
            to,
            action,
            actor: StepActor {
                user_id: actor.user_id.clone(),
                display_name: actor.display_name.clone(),
            },
        });
        self.record(kind, correlation_id, clock);
        Ok(())
    }
}

impl AggregateRoot for Loan {
    type Event = LoanEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            LoanEventKind::LoanRequested(payload) => {
                self.amount = payload.amount;
                self.status = LoanStatus::WaitingApproval;
                self.source = Some(payload.source.clone());
                self.borrower = Some(payload.borrower.clone());
                self.due_date = payload.due_date;
                self.created_at = Some(event.metadata.occurred_at);
                self.updated_at = Some(event.metadata.occurred_at);
            }
            LoanEventKind::LoanTransitioned(payload) => {
                self.status = payload.to;
                self.updated_at = Some(event.metadata.occurred_at);
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use guildhall_test_support::{FixedClock, fixed_now};

    use super::*;

    fn commit(loan: &mut Loan) {
        let events = loan.uncommitted_events().to_vec();
        for event in &events {
            loan.apply(event);
        }
        loan.clear_uncommitted_events();
    }

    fn guild_loan(borrower: &Actor) -> Loan {
        let clock = FixedClock(fixed_now());
        let mut loan = Loan::new(Uuid::new_v4());
        loan.request(
            borrower,
            100,
            LoanSource::Guild {
                guild: "Dawnbreakers".into(),
            },
            None,
            Uuid::new_v4(),
            &clock,
        )
        .unwrap();
        commit(&mut loan);
        loan
    }

    #[test]
    fn test_request_rejects_zero_amount() {
        let clock = FixedClock(fixed_now());
        let mut loan = Loan::new(Uuid::new_v4());

        let result = loan.request(
            &Actor::member("1001", "aster"),
            0,
            LoanSource::Guild { guild: "Dawnbreakers".into() },
            None,
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(loan.uncommitted_events().is_empty());
    }

    #[test]
    fn test_request_rejects_due_date_in_past() {
        let clock = FixedClock(fixed_now());
        let mut loan = Loan::new(Uuid::new_v4());

        let result = loan.request(
            &Actor::member("1001", "aster"),
            100,
            LoanSource::Guild { guild: "Dawnbreakers".into() },
            Some(fixed_now() - Duration::days(1)),
            Uuid::new_v4(),
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_request_records_actor_as_borrower() {
        let loan = guild_loan(&Actor::member("1001", "aster"));

        assert_eq!(loan.status(), LoanStatus::WaitingApproval);
        assert_eq!(loan.borrower().unwrap().discord_id, "1001");
        assert_eq!(loan.created_at, Some(fixed_now()));
    }

    #[test]
    fn test_approve_twice_second_is_invalid_transition() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let leader = Actor::guild_leader("9000", "boss");
        let mut loan = guild_loan(&Actor::member("1001", "aster"));
        loan.transition(&leader, LoanAction::Approve, Uuid::new_v4(), &clock)
            .unwrap();
        commit(&mut loan);

        // Act
        let result = loan.transition(&leader, LoanAction::Approve, Uuid::new_v4(), &clock);

        // Assert
        assert_eq!(result.unwrap_err().conflict_code(), Some(INVALID_TRANSITION));
        assert_eq!(loan.status(), LoanStatus::Active);
        assert!(loan.uncommitted_events().is_empty());
    }

    #[test]
    fn test_borrower_cannot_approve_own_guild_loan() {
        let clock = FixedClock(fixed_now());
        let borrower = Actor::member("1001", "aster");
        let mut loan = guild_loan(&borrower);

        let result = loan.transition(&borrower, LoanAction::Approve, Uuid::new_v4(), &clock);

        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn test_only_borrower_marks_returned() {
        let clock = FixedClock(fixed_now());
        let leader = Actor::guild_leader("9000", "boss");
        let borrower = Actor::member("1001", "aster");
        let mut loan = guild_loan(&borrower);
        loan.transition(&leader, LoanAction::Approve, Uuid::new_v4(), &clock)
            .unwrap();
        commit(&mut loan);

        let by_leader = loan.transition(&leader, LoanAction::MarkReturned, Uuid::new_v4(), &clock);
        loan.transition(&borrower, LoanAction::MarkReturned, Uuid::new_v4(), &clock)
            .unwrap();
        commit(&mut loan);

        assert!(matches!(by_leader, Err(DomainError::Unauthorized(_))));
        assert_eq!(loan.status(), LoanStatus::Returned);
    }

    #[test]
    fn test_merchant_is_the_lender_for_merchant_loans() {
        let clock = FixedClock(fixed_now());
        let mut loan = Loan::new(Uuid::new_v4());
        loan.request(
            &Actor::member("1001", "aster"),
            250,
            LoanSource::Merchant {
                merchant_id: "4004".into(),
            },
            None,
            Uuid::new_v4(),
            &clock,
        )
        .unwrap();
        commit(&mut loan);

        let by_leader = loan.transition(
            &Actor::guild_leader("9000", "boss"),
            LoanAction::Reject,
            Uuid::new_v4(),
            &clock,
        );
        loan.transition(
            &Actor::member("4004", "goldie"),
            LoanAction::Reject,
            Uuid::new_v4(),
            &clock,
        )
        .unwrap();
        commit(&mut loan);

        assert!(matches!(by_leader, Err(DomainError::Unauthorized(_))));
        assert_eq!(loan.status(), LoanStatus::Rejected);
    }
}
