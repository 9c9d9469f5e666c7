//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use guildhall_core::error::DomainError;
use guildhall_core::repository::{EventRepository, StoredEvent, StreamWrite};

const SELECT_COLUMNS: &str = "event_id, aggregate_id, event_type, payload, sequence_number, \
     correlation_id, causation_id, occurred_at";

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DomainError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("migration failed: {e}")))
    }
}

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn row_to_event(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get("event_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        sequence_number: row.try_get("sequence_number")?,
        correlation_id: row.try_get("correlation_id")?,
        causation_id: row.try_get("causation_id")?,
        occurred_at: row.try_get("occurred_at")?,
    })
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM domain_events \
             WHERE aggregate_id = $1 ORDER BY sequence_number"
        );
        let rows = sqlx::query(&sql)
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;
        rows.iter()
            .map(row_to_event)
            .collect::<Result<_, _>>()
            .map_err(|e| infrastructure(&e))
    }

    async fn load_all_events(&self) -> Result<Vec<StoredEvent>, DomainError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM domain_events ORDER BY global_position");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| infrastructure(&e))?;
        rows.iter()
            .map(row_to_event)
            .collect::<Result<_, _>>()
            .map_err(|e| infrastructure(&e))
    }

    async fn append_streams(&self, writes: &[StreamWrite]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;

        // Guard writes insert no rows, so the unique index alone cannot see a
        // writer that commits after their version check. Every writer takes
        // per-stream locks, in sorted order, before checking versions.
        let mut stream_ids: Vec<Uuid> = writes.iter().map(|w| w.aggregate_id).collect();
        stream_ids.sort_unstable();
        stream_ids.dedup();
        for stream_id in stream_ids {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
                .bind(stream_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| infrastructure(&e))?;
        }

        for write in writes {
            let actual: i64 = sqlx::query_scalar(
                "SELECT COALESCE(MAX(sequence_number), 0) FROM domain_events WHERE aggregate_id = $1",
            )
            .bind(write.aggregate_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| infrastructure(&e))?;

            if actual != write.expected_version {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id: write.aggregate_id,
                    expected: write.expected_version,
                    actual,
                });
            }

            for event in &write.events {
                sqlx::query(
                    "INSERT INTO domain_events \
                     (event_id, aggregate_id, event_type, payload, sequence_number, \
                      correlation_id, causation_id, occurred_at) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(event.event_id)
                .bind(event.aggregate_id)
                .bind(&event.event_type)
                .bind(&event.payload)
                .bind(event.sequence_number)
                .bind(event.correlation_id)
                .bind(event.causation_id)
                .bind(event.occurred_at)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    // A concurrent writer committed the same sequence number
                    // after our version check.
                    if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
                        warn!(aggregate_id = %write.aggregate_id, "lost append race");
                        DomainError::ConcurrencyConflict {
                            aggregate_id: write.aggregate_id,
                            expected: write.expected_version,
                            actual: write.expected_version + 1,
                        }
                    } else {
                        infrastructure(&e)
                    }
                })?;
            }
        }

        tx.commit().await.map_err(|e| infrastructure(&e))
    }
}
