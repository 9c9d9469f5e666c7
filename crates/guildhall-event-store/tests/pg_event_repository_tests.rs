//! Integration tests for `PgEventRepository`.
//!
//! These need a live database (`DATABASE_URL`); run them with
//! `cargo test -- --ignored`.

use chrono::Utc;
use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};
use guildhall_event_store::pg_event_repository::PgEventRepository;
use sqlx::PgPool;
use uuid::Uuid;

/// Helper to build a `StoredEvent` with sensible defaults.
fn make_stored_event(aggregate_id: Uuid, sequence_number: i64) -> StoredEvent {
    StoredEvent {
        event_id: Uuid::new_v4(),
        aggregate_id,
        event_type: "test.event".to_string(),
        payload: serde_json::json!({"key": "value"}),
        sequence_number,
        correlation_id: Uuid::new_v4(),
        causation_id: Uuid::new_v4(),
        occurred_at: Utc::now(),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_load_events_returns_empty_vec_for_nonexistent_aggregate(pool: PgPool) {
    let repo = PgEventRepository::new(pool);

    let events = repo.load_events(Uuid::new_v4()).await.unwrap();

    assert!(events.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_append_and_load_round_trip(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let aggregate_id = Uuid::new_v4();
    let event = make_stored_event(aggregate_id, 1);

    repo.append_events(aggregate_id, 0, &[event.clone()])
        .await
        .unwrap();

    let loaded = repo.load_events(aggregate_id).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].event_id, event.event_id);
    assert_eq!(loaded[0].payload, event.payload);
    // PostgreSQL TIMESTAMPTZ has microsecond precision.
    assert_eq!(
        loaded[0].occurred_at.timestamp_micros(),
        event.occurred_at.timestamp_micros()
    );
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_stale_expected_version_is_rejected(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let aggregate_id = Uuid::new_v4();
    repo.append_events(
        aggregate_id,
        0,
        &[
            make_stored_event(aggregate_id, 1),
            make_stored_event(aggregate_id, 2),
        ],
    )
    .await
    .unwrap();

    // Sequence numbers don't collide, but the version check must still reject.
    let result = repo
        .append_events(aggregate_id, 0, &[make_stored_event(aggregate_id, 3)])
        .await;

    match result {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id: conflict_agg_id,
            expected,
            actual,
        }) => {
            assert_eq!(conflict_agg_id, aggregate_id);
            assert_eq!(expected, 0);
            assert_eq!(actual, 2);
        }
        other => panic!("expected ConcurrencyConflict, got {other:?}"),
    }
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_multi_stream_write_rolls_back_on_conflict(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let stream_a = Uuid::new_v4();
    let stream_b = Uuid::new_v4();
    repo.append_events(stream_b, 0, &[make_stored_event(stream_b, 1)])
        .await
        .unwrap();

    let result = repo
        .append_streams(&[
            StreamWrite::new(stream_a, 0, vec![make_stored_event(stream_a, 1)]),
            StreamWrite::new(stream_b, 0, vec![make_stored_event(stream_b, 1)]),
        ])
        .await;

    assert!(matches!(result, Err(DomainError::ConcurrencyConflict { .. })));
    assert!(repo.load_events(stream_a).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_load_all_events_follows_insertion_order(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let stream_a = Uuid::new_v4();
    let stream_b = Uuid::new_v4();
    let first = make_stored_event(stream_b, 1);
    let second = make_stored_event(stream_a, 1);

    repo.append_events(stream_b, 0, &[first.clone()]).await.unwrap();
    repo.append_events(stream_a, 0, &[second.clone()]).await.unwrap();

    let all = repo.load_all_events().await.unwrap();
    let ids: Vec<Uuid> = all.iter().map(|e| e.event_id).collect();
    assert_eq!(ids, vec![first.event_id, second.event_id]);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_stale_guard_rejects_the_whole_write(pool: PgPool) {
    let repo = PgEventRepository::new(pool);
    let guarded = Uuid::new_v4();
    let target = Uuid::new_v4();
    repo.append_events(guarded, 0, &[make_stored_event(guarded, 1)])
        .await
        .unwrap();
    repo.append_events(guarded, 1, &[make_stored_event(guarded, 2)])
        .await
        .unwrap();

    let result = repo
        .append_streams(&[
            StreamWrite::new(target, 0, vec![make_stored_event(target, 1)]),
            StreamWrite::guard(guarded, 1),
        ])
        .await;

    assert!(matches!(
        result,
        Err(DomainError::ConcurrencyConflict { actual: 2, .. })
    ));
    assert!(repo.load_events(target).await.unwrap().is_empty());
}
