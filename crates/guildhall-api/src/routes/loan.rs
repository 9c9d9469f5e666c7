//! Routes for the Loan bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_loan::application::{command_handlers, query_handlers};
use guildhall_loan::domain::commands;
use guildhall_loan::domain::events::LoanSource;
use guildhall_loan::domain::lifecycle::LoanAction;

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::{CommandResponse, CreatedResponse};
use crate::state::AppState;

/// Request body for POST /request.
#[derive(Debug, Deserialize)]
pub struct RequestLoanRequest {
    /// Gold requested.
    pub amount: u64,
    /// The guild or a merchant.
    pub source: LoanSource,
    /// Optional repayment date.
    pub due_date: Option<DateTime<Utc>>,
}

/// Request body for POST /transition.
#[derive(Debug, Deserialize)]
pub struct TransitionLoanRequest {
    /// The loan.
    pub loan_id: Uuid,
    /// `approve`, `reject`, `markReturned` or `confirmCompleted`.
    pub action: LoanAction,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListLoansQuery {
    /// Only loans of this borrower.
    pub borrower: Option<String>,
}

/// POST /request
#[instrument(skip(state, actor, request), fields(amount = request.amount))]
async fn request_loan(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RequestLoanRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let command = commands::RequestLoan {
        correlation_id: Uuid::new_v4(),
        actor,
        loan_id: Uuid::new_v4(),
        amount: request.amount,
        source: request.source,
        due_date: request.due_date,
    };

    info!(correlation_id = %command.correlation_id, "handling request_loan command");

    let stored_events = command_handlers::handle_request_loan(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CreatedResponse::new(command.loan_id, &stored_events)))
}

/// POST /transition
#[instrument(skip(state, actor, request), fields(loan_id = %request.loan_id, action = %request.action))]
async fn transition_loan(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<TransitionLoanRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::TransitionLoan {
        correlation_id: Uuid::new_v4(),
        actor,
        loan_id: request.loan_id,
        action: request.action,
    };

    info!(correlation_id = %command.correlation_id, "handling transition_loan command");

    let stored_events = command_handlers::handle_transition_loan(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{loan_id}
async fn get_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<query_handlers::LoanView>, ApiError> {
    let view = query_handlers::get_loan(loan_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /
async fn list_loans(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListLoansQuery>,
) -> Result<Json<Vec<query_handlers::LoanView>>, ApiError> {
    let views = query_handlers::list_loans(query.borrower.as_deref(), &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the loan context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_loans))
        .route("/request", post(request_loan))
        .route("/transition", post(transition_loan))
        .route("/{loan_id}", get(get_loan))
}
