//! Startup configuration read from the environment.

use std::collections::HashSet;

use crate::error::AppError;

/// Server configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL URL. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    /// Pool size for PostgreSQL.
    pub database_max_connections: u32,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Discord ids allowed to act for the guild.
    pub guild_leader_ids: HashSet<String>,
    /// Attempts per command before a version conflict is reported.
    pub conflict_retry_limit: u32,
    /// Apply `migrations/` on startup.
    pub run_migrations: bool,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the raw value
    /// of a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let guild_leader_ids = var("GUILD_LEADER_IDS")
            .map(|ids| {
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
                10,
            )?,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(var("PORT"), "PORT", 3000)?,
            guild_leader_ids,
            conflict_retry_limit: parse_or(
                var("CONFLICT_RETRY_LIMIT"),
                "CONFLICT_RETRY_LIMIT",
                5,
            )?,
            run_migrations: parse_flag(var("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?,
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The `host:port` pair to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be a valid number: {e}"))),
    }
}

fn parse_flag(raw: Option<String>, key: &str, default: bool) -> Result<bool, AppError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(AppError::Config(format!(
            "{key} must be true or false, got {other:?}"
        ))),
    }
}
