//! Routes for the activity feed: a paged read and a WebSocket push stream.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use guildhall_core::error::DomainError;
use guildhall_core::repository::StoredEvent;
use guildhall_feed::query_handlers::{self, DEFAULT_FEED_LIMIT};
use guildhall_feed::{FeedEntry, FeedKind, Projector};

use crate::error::ApiError;
use crate::extract::ApiQuery;
use crate::state::AppState;

/// Largest page a single feed read returns.
pub const MAX_FEED_LIMIT: usize = 200;

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Page size, capped at [`MAX_FEED_LIMIT`].
    pub limit: Option<usize>,
    /// Only entries of this type.
    #[serde(rename = "type")]
    pub kind: Option<FeedKind>,
}

/// GET /
async fn get_feed(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> Result<Json<Vec<FeedEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_FEED_LIMIT).min(MAX_FEED_LIMIT);
    let entries = query_handlers::get_feed(limit, query.kind, &*state.event_repository).await?;
    Ok(Json(entries))
}

/// GET /ws
async fn feed_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Subscribe before the upgrade so nothing committed meanwhile is missed.
    let events = state.publisher.subscribe();
    ws.on_upgrade(move |socket| stream_feed(socket, state, events))
}

async fn load_projector(state: &AppState) -> Result<Projector, DomainError> {
    let all_events = state.event_repository.load_all_events().await?;
    Projector::from_log(&all_events)
}

/// Folds a newly committed event into `projector` and renders it.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the payload cannot be decoded.
pub fn render_committed(
    projector: &mut Projector,
    event: &StoredEvent,
) -> Result<Option<FeedEntry>, DomainError> {
    projector.observe(event)?;
    projector.render(event)
}

async fn stream_feed(
    socket: WebSocket,
    state: AppState,
    mut events: broadcast::Receiver<StoredEvent>,
) {
    let (mut sender, mut incoming) = socket.split();
    let mut projector = match load_projector(&state).await {
        Ok(projector) => projector,
        Err(e) => {
            warn!(error = %e, "could not build feed projection");
            return;
        }
    };
    info!("feed subscriber connected");

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let entry = match render_committed(&mut projector, &event) {
                        Ok(Some(entry)) => entry,
                        Ok(None) => continue,
                        Err(e) => {
                            warn!(event_id = %event.event_id, error = %e, "skipping undecodable event");
                            continue;
                        }
                    };
                    let text = match serde_json::to_string(&entry) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, "failed to encode feed entry");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "feed subscriber lagged, rebuilding projection");
                    match load_projector(&state).await {
                        Ok(rebuilt) => projector = rebuilt,
                        Err(e) => {
                            warn!(error = %e, "could not rebuild feed projection");
                            break;
                        }
                    }
                }
                Err(RecvError::Closed) => break,
            },
            message = incoming.next() => match message {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("feed subscriber disconnected");
}

/// Returns the router for the feed.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_feed))
        .route("/ws", get(feed_ws))
}
