//! Routes for the Character Management bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_character::application::{command_handlers, query_handlers};
use guildhall_character::domain::commands;
use guildhall_character::domain::events::{ChecklistPeriod, Stats};

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::{CommandResponse, CreatedResponse};
use crate::state::AppState;

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    /// Character name.
    pub name: String,
    /// Current class.
    pub class: String,
    /// Base class.
    pub main_class: String,
    /// Initial stats; zeroes when omitted.
    #[serde(default)]
    pub stats: Stats,
}

/// Request body for POST /update-profile.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// The character to update.
    pub character_id: Uuid,
    /// New name.
    pub name: String,
    /// New class.
    pub class: String,
    /// New base class.
    pub main_class: String,
}

/// Request body for POST /update-stats.
#[derive(Debug, Deserialize)]
pub struct UpdateStatsRequest {
    /// The character to update.
    pub character_id: Uuid,
    /// Replacement stats.
    pub stats: Stats,
}

/// Request body for POST /record-checklist.
#[derive(Debug, Deserialize)]
pub struct RecordChecklistRequest {
    /// The character to update.
    pub character_id: Uuid,
    /// Daily or weekly.
    pub period: ChecklistPeriod,
    /// Task name.
    pub task: String,
    /// New counter value.
    pub count: u32,
}

/// Request body for POST /reset-checklist.
#[derive(Debug, Deserialize)]
pub struct ResetChecklistRequest {
    /// The character to update.
    pub character_id: Uuid,
    /// Daily or weekly.
    pub period: ChecklistPeriod,
}

/// Request body for POST /archive.
#[derive(Debug, Deserialize)]
pub struct ArchiveCharacterRequest {
    /// The character to archive.
    pub character_id: Uuid,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListCharactersQuery {
    /// Only characters owned by this user.
    pub owner: Option<String>,
}

/// POST /create
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn create_character(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<CreateCharacterRequest>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let command = commands::CreateCharacter {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: Uuid::new_v4(),
        name: request.name,
        class: request.class,
        main_class: request.main_class,
        stats: request.stats,
    };

    info!(correlation_id = %command.correlation_id, "handling create_character command");

    let stored_events = command_handlers::handle_create_character(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CreatedResponse::new(command.character_id, &stored_events)))
}

/// POST /update-profile
#[instrument(skip(state, actor, request), fields(character_id = %request.character_id))]
async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateProfile {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: request.character_id,
        name: request.name,
        class: request.class,
        main_class: request.main_class,
    };

    info!(correlation_id = %command.correlation_id, "handling update_profile command");

    let stored_events = command_handlers::handle_update_profile(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /update-stats
#[instrument(skip(state, actor, request), fields(character_id = %request.character_id))]
async fn update_stats(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<UpdateStatsRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateStats {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: request.character_id,
        stats: request.stats,
    };

    info!(correlation_id = %command.correlation_id, "handling update_stats command");

    let stored_events = command_handlers::handle_update_stats(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /record-checklist
#[instrument(skip(state, actor, request), fields(character_id = %request.character_id))]
async fn record_checklist(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RecordChecklistRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RecordChecklist {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: request.character_id,
        period: request.period,
        task: request.task,
        count: request.count,
    };

    info!(correlation_id = %command.correlation_id, "handling record_checklist command");

    let stored_events = command_handlers::handle_record_checklist(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /reset-checklist
#[instrument(skip(state, actor, request), fields(character_id = %request.character_id))]
async fn reset_checklist(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<ResetChecklistRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ResetChecklist {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: request.character_id,
        period: request.period,
    };

    info!(correlation_id = %command.correlation_id, "handling reset_checklist command");

    let stored_events = command_handlers::handle_reset_checklist(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /archive
#[instrument(skip(state, actor, request), fields(character_id = %request.character_id))]
async fn archive_character(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<ArchiveCharacterRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ArchiveCharacter {
        correlation_id: Uuid::new_v4(),
        actor,
        character_id: request.character_id,
    };

    info!(correlation_id = %command.correlation_id, "handling archive_character command");

    let stored_events = command_handlers::handle_archive_character(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{character_id}
async fn get_character(
    State(state): State<AppState>,
    Path(character_id): Path<Uuid>,
) -> Result<Json<query_handlers::CharacterView>, ApiError> {
    let view = query_handlers::get_character_by_id(character_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /
async fn list_characters(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListCharactersQuery>,
) -> Result<Json<Vec<query_handlers::CharacterView>>, ApiError> {
    let views =
        query_handlers::list_characters(query.owner.as_deref(), &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the character context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_characters))
        .route("/create", post(create_character))
        .route("/update-profile", post(update_profile))
        .route("/update-stats", post(update_stats))
        .route("/record-checklist", post(record_checklist))
        .route("/reset-checklist", post(reset_checklist))
        .route("/archive", post(archive_character))
        .route("/{character_id}", get(get_character))
}
