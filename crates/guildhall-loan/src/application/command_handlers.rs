//! Command handlers for the Loan context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use guildhall_core::aggregate::AggregateRoot;
use guildhall_core::clock::Clock;
use guildhall_core::error::DomainError;
use guildhall_core::event::{DomainEvent, EventMetadata, decode_payload};
use guildhall_core::repository::{EventRepository, StoredEvent};
use guildhall_core::retry::{RetryPolicy, retry_on_conflict};
use guildhall_market::application::command_handlers::load_registered_merchant;
use tracing::debug;
use uuid::Uuid;

use crate::domain::aggregates::Loan;
use crate::domain::commands::{RequestLoan, TransitionLoan};
use crate::domain::events::{LoanEvent, LoanEventKind, LoanSource};

/// Reconstitutes a `Loan` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(loan_id: Uuid, existing_events: &[StoredEvent]) -> Result<Loan, DomainError> {
    let mut loan = Loan::new(loan_id);
    for stored in existing_events {
        let kind: LoanEventKind = decode_payload(stored)?;
        loan.apply(&LoanEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        });
    }
    Ok(loan)
}

/// Loads and reconstitutes an existing loan.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the loan has no events.
pub async fn load_loan(loan_id: Uuid, repo: &dyn EventRepository) -> Result<Loan, DomainError> {
    let existing_events = repo.load_events(loan_id).await?;
    if existing_events.is_empty() {
        return Err(DomainError::AggregateNotFound(loan_id));
    }
    reconstitute(loan_id, &existing_events)
}

async fn persist(loan: &Loan, repo: &dyn EventRepository) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events: Vec<StoredEvent> = loan
        .uncommitted_events()
        .iter()
        .map(DomainEvent::to_stored)
        .collect();

    repo.append_events(loan.id, loan.version(), &stored_events)
        .await?;
    debug!(loan_id = %loan.id, status = %loan.status(), count = stored_events.len(), "loan events persisted");

    Ok(stored_events)
}

/// Handles the `RequestLoan` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unregistered merchant,
/// `DomainError::Validation` for a bad amount or due date, and `DomainError`
/// if loading or appending fails.
pub async fn handle_request_loan(
    command: &RequestLoan,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    if let LoanSource::Merchant { merchant_id } = &command.source {
        load_registered_merchant(merchant_id, repo).await?;
    }

    let existing_events = repo.load_events(command.loan_id).await?;
    let mut loan = reconstitute(command.loan_id, &existing_events)?;
    loan.request(
        &command.actor,
        command.amount,
        command.source.clone(),
        command.due_date,
        command.correlation_id,
        clock,
    )?;

    persist(&loan, repo).await
}

async fn transition_once(
    command: &TransitionLoan,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut loan = load_loan(command.loan_id, repo).await?;
    loan.transition(&command.actor, command.action, command.correlation_id, clock)?;

    persist(&loan, repo).await
}

/// Handles the `TransitionLoan` command. The append is conditional on the
/// version the lifecycle check ran against; a lost race re-runs the check.
///
/// # Errors
///
/// Returns `DomainError::Conflict` (`invalid_transition`) for a step the
/// current status does not allow, `DomainError::Unauthorized` for the wrong
/// side, and `DomainError` if loading or appending fails.
pub async fn handle_transition_loan(
    command: &TransitionLoan,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    retry: RetryPolicy,
) -> Result<Vec<StoredEvent>, DomainError> {
    retry_on_conflict(retry, move || transition_once(command, clock, repo)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guildhall_core::actor::Actor;
    use guildhall_core::repository::StreamWrite;
    use guildhall_event_store::InMemoryEventRepository;
    use guildhall_market::application::command_handlers::handle_register_merchant;
    use guildhall_market::domain::commands::RegisterMerchant;
    use guildhall_test_support::{
        EmptyEventRepository, FixedClock, RacingEventRepository, fixed_now,
    };

    use super::*;
    use crate::domain::aggregates::INVALID_TRANSITION;
    use crate::domain::events::LOAN_TRANSITIONED_EVENT_TYPE;
    use crate::domain::lifecycle::{LoanAction, LoanStatus};

    async fn request_guild_loan(repo: &dyn EventRepository, borrower: &Actor) -> Uuid {
        let loan_id = Uuid::new_v4();
        let command = RequestLoan {
            correlation_id: Uuid::new_v4(),
            actor: borrower.clone(),
            loan_id,
            amount: 100,
            source: LoanSource::Guild {
                guild: "Dawnbreakers".into(),
            },
            due_date: None,
        };
        handle_request_loan(&command, &FixedClock(fixed_now()), repo)
            .await
            .unwrap();
        loan_id
    }

    fn step(actor: &Actor, loan_id: Uuid, action: LoanAction) -> TransitionLoan {
        TransitionLoan {
            correlation_id: Uuid::new_v4(),
            actor: actor.clone(),
            loan_id,
            action,
        }
    }

    #[tokio::test]
    async fn test_handle_request_loan_for_unknown_merchant_is_not_found() {
        let command = RequestLoan {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            loan_id: Uuid::new_v4(),
            amount: 100,
            source: LoanSource::Merchant {
                merchant_id: "4004".into(),
            },
            due_date: None,
        };

        let result =
            handle_request_loan(&command, &FixedClock(fixed_now()), &EmptyEventRepository).await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound(_))));
    }

    #[tokio::test]
    async fn test_handle_request_loan_from_registered_merchant() {
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let register = RegisterMerchant {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("4004", "goldie"),
            discord_name: "Goldie".into(),
            gold_available: 1_000,
            price_per_100: 50,
            advertisement: String::new(),
        };
        handle_register_merchant(&register, &clock, &repo).await.unwrap();
        let loan_id = Uuid::new_v4();
        let command = RequestLoan {
            correlation_id: Uuid::new_v4(),
            actor: Actor::member("1001", "aster"),
            loan_id,
            amount: 300,
            source: LoanSource::Merchant {
                merchant_id: "4004".into(),
            },
            due_date: Some(fixed_now() + chrono::Duration::days(7)),
        };

        handle_request_loan(&command, &clock, &repo).await.unwrap();

        let loan = load_loan(loan_id, &repo).await.unwrap();
        assert_eq!(loan.status(), LoanStatus::WaitingApproval);
    }

    #[tokio::test]
    async fn test_full_lifecycle_appends_one_event_per_step() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let borrower = Actor::member("1001", "aster");
        let leader = Actor::guild_leader("9000", "boss");
        let loan_id = request_guild_loan(&repo, &borrower).await;

        // Act
        for (actor, action) in [
            (&leader, LoanAction::Approve),
            (&borrower, LoanAction::MarkReturned),
            (&leader, LoanAction::ConfirmCompleted),
        ] {
            handle_transition_loan(&step(actor, loan_id, action), &clock, &repo, RetryPolicy::default())
                .await
                .unwrap();
        }

        // Assert
        let loan = load_loan(loan_id, &repo).await.unwrap();
        assert_eq!(loan.status(), LoanStatus::Completed);
        let events = repo.load_events(loan_id).await.unwrap();
        let steps = events
            .iter()
            .filter(|e| e.event_type == LOAN_TRANSITIONED_EVENT_TYPE)
            .count();
        assert_eq!(steps, 3);
    }

    #[tokio::test]
    async fn test_handle_transition_loan_second_approval_is_conflict() {
        // Arrange
        let repo = InMemoryEventRepository::new();
        let clock = FixedClock(fixed_now());
        let leader = Actor::guild_leader("9000", "boss");
        let loan_id = request_guild_loan(&repo, &Actor::member("1001", "aster")).await;
        handle_transition_loan(
            &step(&leader, loan_id, LoanAction::Approve),
            &clock,
            &repo,
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        // Act
        let result = handle_transition_loan(
            &step(&leader, loan_id, LoanAction::Approve),
            &clock,
            &repo,
            RetryPolicy::default(),
        )
        .await;

        // Assert
        assert_eq!(result.unwrap_err().conflict_code(), Some(INVALID_TRANSITION));
        let loan = load_loan(loan_id, &repo).await.unwrap();
        assert_eq!(loan.status(), LoanStatus::Active);
        assert_eq!(loan.version(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_approval_loses_race_and_fails_on_recheck() {
        // Arrange: another leader's approval commits between this handler's
        // read and its write.
        let inner = Arc::new(InMemoryEventRepository::new());
        let clock = FixedClock(fixed_now());
        let loan_id = request_guild_loan(inner.as_ref(), &Actor::member("1001", "aster")).await;
        let rival = {
            let mut loan = load_loan(loan_id, inner.as_ref()).await.unwrap();
            loan.transition(
                &Actor::guild_leader("9001", "other boss"),
                LoanAction::Approve,
                Uuid::new_v4(),
                &clock,
            )
            .unwrap();
            vec![StreamWrite::new(
                loan.id,
                loan.version(),
                loan.uncommitted_events().iter().map(DomainEvent::to_stored).collect(),
            )]
        };
        let repo = RacingEventRepository::new(inner.clone(), rival);

        // Act
        let result = handle_transition_loan(
            &step(&Actor::guild_leader("9000", "boss"), loan_id, LoanAction::Approve),
            &clock,
            &repo,
            RetryPolicy::default(),
        )
        .await;

        // Assert
        assert_eq!(result.unwrap_err().conflict_code(), Some(INVALID_TRANSITION));
        assert_eq!(repo.append_attempts(), 1);
        let loan = load_loan(loan_id, inner.as_ref()).await.unwrap();
        assert_eq!(loan.status(), LoanStatus::Active);
        assert_eq!(loan.version(), 2);
    }

    #[tokio::test]
    async fn test_handle_transition_loan_unknown_id_is_not_found() {
        let loan_id = Uuid::new_v4();

        let result = handle_transition_loan(
            &step(&Actor::guild_leader("9000", "boss"), loan_id, LoanAction::Approve),
            &FixedClock(fixed_now()),
            &EmptyEventRepository,
            RetryPolicy::default(),
        )
        .await;

        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, loan_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }
}
