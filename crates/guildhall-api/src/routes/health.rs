//! Liveness and store reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

/// Body of GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the event store cannot be read.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    // The nil stream is never written; reading it only proves the store answers.
    let (code, status) = match state.event_repository.load_events(Uuid::nil()).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "event store unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };
    let body = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
    };
    (code, Json(body))
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use guildhall_core::retry::RetryPolicy;
    use guildhall_test_support::{FailingEventRepository, FixedClock, fixed_now};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_degraded_when_store_fails() {
        // Arrange
        let state = AppState::new(
            Arc::new(FixedClock(fixed_now())),
            Arc::new(FailingEventRepository),
            HashSet::new(),
            RetryPolicy::default(),
        );
        let app = router().with_state(state);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(json["status"], "degraded");
    }
}
