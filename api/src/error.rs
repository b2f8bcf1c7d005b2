//! Unified error types for the Insights API
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic errors
//! - `QueryError`: Filter translation and query rendering errors
//! - `SourceError`: Data source execution errors (SQL sources, Elasticsearch)
//! - `MailerError`: Report delivery errors
//! - `AppError`: Application layer errors (wraps the others for HTTP responses)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors - pure business logic errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid dashboard: {0}")]
    InvalidDashboard(String),

    #[error("Invalid widget: {0}")]
    InvalidWidget(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while translating filters into backend queries
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid filter '{field}': {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("Query must be built before rendering '{0}'")]
    NotBuilt(&'static str),
}

/// Data source execution errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Elasticsearch error: {status} - {message}")]
    Elasticsearch { status: u16, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Report delivery errors
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mail service error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Application layer errors - used by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Mailer error: {0}")]
    Mailer(#[from] MailerError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Domain(DomainError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "Not found", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Validation(msg)) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::InvalidDashboard(msg)) => (
                StatusCode::BAD_REQUEST,
                "Invalid dashboard",
                Some(msg.clone()),
            ),
            AppError::Domain(DomainError::InvalidWidget(msg)) => {
                (StatusCode::BAD_REQUEST, "Invalid widget", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Forbidden(msg)) => {
                (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "Conflict", Some(msg.clone()))
            }
            AppError::Domain(DomainError::Database(msg)) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Domain(DomainError::Internal(msg)) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            AppError::Query(e) => (StatusCode::BAD_REQUEST, "Invalid query", Some(e.to_string())),
            AppError::Source(SourceError::Query(e)) => {
                (StatusCode::BAD_REQUEST, "Invalid query", Some(e.to_string()))
            }
            AppError::Source(e) => {
                tracing::error!("Source error: {}", e);
                (StatusCode::BAD_GATEWAY, "Data source error", None)
            }
            AppError::Mailer(e) => {
                tracing::error!("Mailer error: {}", e);
                (StatusCode::BAD_GATEWAY, "Mail service error", None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::Domain(DomainError::NotFound("dashboard".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unsupported_operation_maps_to_400() {
        let response =
            AppError::Query(QueryError::UnsupportedOperation("between".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Source(SourceError::Query(QueryError::UnsupportedOperation(
            "between".into(),
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        let response =
            AppError::Domain(DomainError::Conflict("report in progress".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn source_failure_hides_details() {
        let response = AppError::Source(SourceError::Elasticsearch {
            status: 500,
            message: "shard failure".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
