//! Guildhall HTTP API.
//!
//! Thin axum layer over the bounded-context crates: routes translate
//! requests into commands, authenticate the caller and map `DomainError`
//! onto HTTP statuses.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the dashboard's origin once it is deployed.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/characters", routes::character::router())
        .nest("/api/v1/parties", routes::party::router())
        .nest("/api/v1/loans", routes::loan::router())
        .nest("/api/v1/merchants", routes::market::router())
        .nest("/api/v1/donations", routes::donation::router())
        .nest("/api/v1/tournaments", routes::tournament::router())
        .nest("/api/v1/feed", routes::feed::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
