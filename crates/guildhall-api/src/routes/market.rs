//! Routes for the Marketplace bounded context.
//!
//! Every command acts on the caller's own merchant record.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use guildhall_market::application::{command_handlers, query_handlers};
use guildhall_market::domain::commands;
use guildhall_market::domain::events::MerchantStatus;

use crate::auth::AuthenticatedActor;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /register.
#[derive(Debug, Deserialize)]
pub struct RegisterMerchantRequest {
    /// Name shown to buyers.
    pub discord_name: String,
    /// Gold on offer.
    pub gold_available: u64,
    /// Price per 100 gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    #[serde(default)]
    pub advertisement: String,
}

/// Request body for POST /update-listing.
#[derive(Debug, Deserialize)]
pub struct UpdateListingRequest {
    /// Gold on offer.
    pub gold_available: u64,
    /// Price per 100 gold.
    pub price_per_100: u64,
    /// Free-form advertisement.
    #[serde(default)]
    pub advertisement: String,
}

/// Request body for POST /rename.
#[derive(Debug, Deserialize)]
pub struct RenameMerchantRequest {
    /// New display name.
    pub discord_name: String,
}

/// Request body for POST /set-status.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    /// `open` or `closed`.
    pub status: MerchantStatus,
}

/// Request body for POST /record-sale.
#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    /// Buyer's Discord id.
    pub buyer_id: String,
    /// Buyer's display name.
    pub buyer_name: String,
    /// Gold sold.
    pub amount: u64,
}

/// Request body for POST /list-item.
#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    /// Item name.
    pub item_name: String,
    /// Asking price.
    pub price: u64,
}

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct ListMerchantsQuery {
    /// Only merchants in this status.
    pub status: Option<MerchantStatus>,
}

/// POST /register
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn register_merchant(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RegisterMerchantRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RegisterMerchant {
        correlation_id: Uuid::new_v4(),
        actor,
        discord_name: request.discord_name,
        gold_available: request.gold_available,
        price_per_100: request.price_per_100,
        advertisement: request.advertisement,
    };

    info!(correlation_id = %command.correlation_id, "handling register_merchant command");

    let stored_events = command_handlers::handle_register_merchant(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /update-listing
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn update_listing(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<UpdateListingRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateListing {
        correlation_id: Uuid::new_v4(),
        actor,
        gold_available: request.gold_available,
        price_per_100: request.price_per_100,
        advertisement: request.advertisement,
    };

    info!(correlation_id = %command.correlation_id, "handling update_listing command");

    let stored_events = command_handlers::handle_update_listing(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /rename
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn rename_merchant(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RenameMerchantRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RenameMerchant {
        correlation_id: Uuid::new_v4(),
        actor,
        discord_name: request.discord_name,
    };

    info!(correlation_id = %command.correlation_id, "handling rename_merchant command");

    let stored_events = command_handlers::handle_rename_merchant(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /set-status
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn set_status(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<SetStatusRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetMerchantStatus {
        correlation_id: Uuid::new_v4(),
        actor,
        status: request.status,
    };

    info!(correlation_id = %command.correlation_id, "handling set_merchant_status command");

    let stored_events = command_handlers::handle_set_merchant_status(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /record-sale
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id, amount = request.amount))]
async fn record_sale(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<RecordSaleRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RecordGoldSale {
        correlation_id: Uuid::new_v4(),
        actor,
        buyer_id: request.buyer_id,
        buyer_name: request.buyer_name,
        amount: request.amount,
    };

    info!(correlation_id = %command.correlation_id, "handling record_gold_sale command");

    let stored_events = command_handlers::handle_record_gold_sale(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        state.retry,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// POST /list-item
#[instrument(skip(state, actor, request), fields(user_id = %actor.user_id))]
async fn list_item(
    State(state): State<AppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ApiJson(request): ApiJson<ListItemRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ListItem {
        correlation_id: Uuid::new_v4(),
        actor,
        item_name: request.item_name,
        price: request.price,
    };

    info!(correlation_id = %command.correlation_id, "handling list_item command");

    let stored_events = command_handlers::handle_list_item(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(stored_events.into()))
}

/// GET /{discord_id}
async fn get_merchant(
    State(state): State<AppState>,
    Path(discord_id): Path<String>,
) -> Result<Json<query_handlers::MerchantView>, ApiError> {
    let view = query_handlers::get_merchant(&discord_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /
async fn list_merchants(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListMerchantsQuery>,
) -> Result<Json<Vec<query_handlers::MerchantView>>, ApiError> {
    let views = query_handlers::list_merchants(query.status, &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the marketplace context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_merchants))
        .route("/register", post(register_merchant))
        .route("/update-listing", post(update_listing))
        .route("/rename", post(rename_merchant))
        .route("/set-status", post(set_status))
        .route("/record-sale", post(record_sale))
        .route("/list-item", post(list_item))
        .route("/{discord_id}", get(get_merchant))
}
