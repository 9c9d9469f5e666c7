//! Guildhall API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use guildhall_core::clock::SystemClock;
use guildhall_core::repository::EventRepository;
use guildhall_core::retry::RetryPolicy;
use guildhall_event_store::{InMemoryEventRepository, PgEventRepository};
use sqlx::postgres::PgPoolOptions;

use guildhall_api::config::AppConfig;
use guildhall_api::error::AppError;
use guildhall_api::state::AppState;
use guildhall_api::telemetry;

async fn build_store(config: &AppConfig) -> Result<Arc<dyn EventRepository>, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using the in-memory event store");
        return Ok(Arc::new(InMemoryEventRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    let repository = PgEventRepository::new(pool);
    if config.run_migrations {
        repository.run_migrations().await?;
        tracing::info!("migrations applied");
    }
    Ok(Arc::new(repository))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let tracer_provider = telemetry::init_tracing(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Guildhall API server");

    let store = build_store(&config).await?;
    let app_state = AppState::new(
        Arc::new(SystemClock),
        store,
        config.guild_leader_ids.clone(),
        RetryPolicy::new(config.conflict_retry_limit),
    );
    let app = guildhall_api::app(app_state);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    telemetry::shutdown(tracer_provider);
    served?;
    Ok(())
}
