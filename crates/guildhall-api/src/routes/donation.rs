//! Routes for the Donation bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_donation::application::{command_handlers, query_handlers};
use guildhall_donation::domain::commands;
use guildhall_donation::domain::events::{DonationStatus, Gift};

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::{CommandResponse, CreatedResponse};
use crate::state::AppState;

/// Request body for POST /pledge.
#[derive(Debug, Deserialize)]
pub struct PledgeRequest {
    /// Gold or an item stack.
    pub gift: Gift,
}

/// Request body for POST /approve.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// The donation.
    pub donation_id: Uuid,
}

/// Request body for POST /reject.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// The donation.
    pub donation_id: Uuid,
    /// Optional note for the donor.
    pub reason: Option<String>,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListDonationsQuery {
    /// Only donations in this status.
    pub status: Option<DonationStatus>,
}

/// POST /pledge
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn pledge_donation(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<PledgeRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let command = commands::PledgeDonation {
        correlation_id: Uuid::new_v4(),
        actor,
        donation_id: Uuid::new_v4(),
        gift: request.gift,
    };

    info!(correlation_id = %command.correlation_id, "handling pledge_donation command");

    let stored_events = command_handlers::handle_pledge_donation(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CreatedResponse::new(command.donation_id, &stored_events)))
}

/// POST /approve
#[instrument(skip(state, actor, request), fields(donation_id = %request.donation_id))]
async fn approve_donation(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<ApproveRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ApproveDonation {
        correlation_id: Uuid::new_v4(),
        actor,
        donation_id: request.donation_id,
    };

    info!(correlation_id = %command.correlation_id, "handling approve_donation command");

    let stored_events = command_handlers::handle_approve_donation(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /reject
#[instrument(skip(state, actor, request), fields(donation_id = %request.donation_id))]
async fn reject_donation(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RejectRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RejectDonation {
        correlation_id: Uuid::new_v4(),
        actor,
        donation_id: request.donation_id,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling reject_donation command");

    let stored_events = command_handlers::handle_reject_donation(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{donation_id}
async fn get_donation(
    State(state): State<AppState>,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<query_handlers::DonationView>, ApiError> {
    let view = query_handlers::get_donation(donation_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /
async fn list_donations(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListDonationsQuery>,
) -> Result<Json<Vec<query_handlers::DonationView>>, ApiError> {
    let views = query_handlers::list_donations(query.status, &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the donation context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_donations))
        .route("/pledge", post(pledge_donation))
        .route("/approve", post(approve_donation))
        .route("/reject", post(reject_donation))
        .route("/{donation_id}", get(get_donation))
}
