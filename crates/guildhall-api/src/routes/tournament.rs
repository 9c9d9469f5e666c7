//! Routes for the Tournament bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_tournament::application::{command_handlers, query_handlers};
use guildhall_tournament::domain::commands;

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::routes::{CommandResponse, CreatedResponse};
use crate::state::AppState;

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    /// Tournament name.
    pub name: String,
    /// Participant cap.
    pub max_participants: u32,
}

/// Request body for POST /join.
#[derive(Debug, Deserialize)]
pub struct JoinTournamentRequest {
    /// The tournament.
    pub tournament_id: Uuid,
    /// The caller's character.
    pub character_id: Uuid,
}

/// Request body for POST /start and POST /complete.
#[derive(Debug, Deserialize)]
pub struct TournamentStepRequest {
    /// The tournament.
    pub tournament_id: Uuid,
}

/// POST /create
#[instrument(skip(state, actor, request), fields(name = %request.name))]
async fn create_tournament(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<CreateTournamentRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let command = commands::CreateTournament {
        correlation_id: Uuid::new_v4(),
        actor,
        tournament_id: Uuid::new_v4(),
        name: request.name,
        max_participants: request.max_participants,
    };

    info!(correlation_id = %command.correlation_id, "handling create_tournament command");

    let stored_events = command_handlers::handle_create_tournament(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CreatedResponse::new(command.tournament_id, &stored_events)))
}

/// POST /join
#[instrument(skip(state, actor, request), fields(tournament_id = %request.tournament_id))]
async fn join_tournament(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<JoinTournamentRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::JoinTournament {
        correlation_id: Uuid::new_v4(),
        actor,
        tournament_id: request.tournament_id,
        character_id: request.character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling join_tournament command");

    let stored_events = command_handlers::handle_join_tournament(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /start
#[instrument(skip(state, actor, request), fields(tournament_id = %request.tournament_id))]
async fn start_tournament(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<TournamentStepRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::StartTournament {
        correlation_id: Uuid::new_v4(),
        actor,
        tournament_id: request.tournament_id,
    };

    info!(correlation_id = %command.correlation_id, "handling start_tournament command");

    let stored_events = command_handlers::handle_start_tournament(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /complete
#[instrument(skip(state, actor, request), fields(tournament_id = %request.tournament_id))]
async fn complete_tournament(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<TournamentStepRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CompleteTournament {
        correlation_id: Uuid::new_v4(),
        actor,
        tournament_id: request.tournament_id,
    };

    info!(correlation_id = %command.correlation_id, "handling complete_tournament command");

    let stored_events = command_handlers::handle_complete_tournament(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{tournament_id}
async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<Uuid>,
) -> Result<Json<query_handlers::TournamentView>, ApiError> {
    let view = query_handlers::get_tournament(tournament_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /
async fn list_tournaments(
    State(state): State<AppState>,
) -> Result<Json<Vec<query_handlers::TournamentView>>, ApiError> {
    let views = query_handlers::list_tournaments(&*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the tournament context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tournaments))
        .route("/create", post(create_tournament))
        .route("/join", post(join_tournament))
        .route("/start", post(start_tournament))
        .route("/complete", post(complete_tournament))
        .route("/{tournament_id}", get(get_tournament))
}
