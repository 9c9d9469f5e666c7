//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use guildhall_core::retry::RetryPolicy;
use guildhall_event_store::InMemoryEventRepository;
use guildhall_test_support::{FixedClock, fixed_now};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use guildhall_api::state::AppState;

/// Discord id configured as guild leader in every test app.
pub const LEADER_ID: &str = "9000";

/// Build the full app router over a fresh in-memory store with a fixed clock.
/// Uses the same route structure as `main.rs`.
pub fn build_test_app() -> Router {
    let app_state = AppState::new(
        Arc::new(FixedClock(fixed_now())),
        Arc::new(InMemoryEventRepository::new()),
        HashSet::from([LEADER_ID.to_string()]),
        RetryPolicy::default(),
    );
    guildhall_api::app(app_state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request as `user_id` with a JSON body and return the response.
pub async fn post_json(
    app: &Router,
    uri: &str,
    user_id: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user-id", user_id)
        .header("x-user-name", format!("user-{user_id}"))
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Reads the `id` of a creation response.
pub fn created_id(json: &serde_json::Value) -> Uuid {
    json["id"].as_str().unwrap().parse().unwrap()
}

/// Creates a character owned by `user_id` and returns its id.
pub async fn create_character(app: &Router, user_id: &str, name: &str) -> Uuid {
    let (status, json) = post_json(
        app,
        "/api/v1/characters/create",
        user_id,
        &serde_json::json!({ "name": name, "class": "Gladiator", "main_class": "Warrior" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    created_id(&json)
}
