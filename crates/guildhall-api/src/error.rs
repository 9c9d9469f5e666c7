//! Guildhall — API error types.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use guildhall_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Migrations or another store operation failed during startup.
    #[error("store error: {0}")]
    Store(#[from] DomainError),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A command or query was rejected by the domain.
    Domain(DomainError),
    /// The request carried no usable identity.
    Unauthenticated(String),
    /// The body or query string could not be decoded into the request type.
    Malformed(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Malformed(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Self::Domain(err) => match err {
                DomainError::AggregateNotFound(_) => {
                    (StatusCode::NOT_FOUND, "aggregate_not_found")
                }
                DomainError::Unauthorized(_) => (StatusCode::FORBIDDEN, "unauthorized"),
                DomainError::Conflict { code, .. } => (StatusCode::CONFLICT, *code),
                DomainError::ConcurrencyConflict { .. } => {
                    (StatusCode::CONFLICT, "concurrency_conflict")
                }
                DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                DomainError::Infrastructure(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = match self {
            Self::Domain(err) => err.to_string(),
            Self::Unauthenticated(message) | Self::Malformed(message) => message,
        };
        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
