//! Routes for the Party bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_party::application::{command_handlers, query_handlers};
use guildhall_party::domain::commands;

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::{CommandResponse, CreatedResponse};
use crate::state::AppState;

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreatePartyRequest {
    /// The nest the party is formed for.
    pub nest: String,
    /// Seat count.
    pub max_member: u32,
}

/// Request body for POST /join and POST /leave.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    /// The party.
    pub party_id: Uuid,
    /// The caller's character.
    pub character_id: Uuid,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListPartiesQuery {
    /// Nest name, matched case-insensitively.
    pub nest: String,
}

/// POST /create
#[instrument(skip(state, actor, request), fields(nest = %request.nest))]
async fn create_party(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<CreatePartyRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let command = commands::CreateParty {
        correlation_id: Uuid::new_v4(),
        actor,
        party_id: Uuid::new_v4(),
        nest: request.nest,
        max_member: request.max_member,
    };

    info!(correlation_id = %command.correlation_id, "handling create_party command");

    let stored_events = command_handlers::handle_create_party(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(CreatedResponse::new(command.party_id, &stored_events)))
}

/// POST /join
#[instrument(skip(state, actor, request), fields(party_id = %request.party_id, character_id = %request.character_id))]
async fn join_party(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<MembershipRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::JoinParty {
        correlation_id: Uuid::new_v4(),
        actor,
        party_id: request.party_id,
        character_id: request.character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling join_party command");

    let stored_events = command_handlers::handle_join_party(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /leave
#[instrument(skip(state, actor, request), fields(party_id = %request.party_id, character_id = %request.character_id))]
async fn leave_party(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<MembershipRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::LeaveParty {
        correlation_id: Uuid::new_v4(),
        actor,
        party_id: request.party_id,
        character_id: request.character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling leave_party command");

    let stored_events = command_handlers::handle_leave_party(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{party_id}
async fn get_party(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<Json<query_handlers::PartyView>, ApiError> {
    let view = query_handlers::get_party_by_id(party_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /?nest=
async fn list_nest_parties(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPartiesQuery>,
) -> Result<Json<Vec<query_handlers::PartyView>>, ApiError> {
    let views = query_handlers::list_nest_parties(&query.nest, &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the party context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_nest_parties))
        .route("/create", post(create_party))
        .route("/join", post(join_party))
        .route("/leave", post(leave_party))
        .route("/{party_id}", get(get_party))
}
