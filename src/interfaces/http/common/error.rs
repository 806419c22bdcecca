//! Mapping from `DomainError` to HTTP responses

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Error body shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            fields: None,
        }
    }

    pub fn with_fields(fields: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            success: false,
            error: "Validation failed".to_string(),
            fields: Some(fields),
        }
    }
}

/// Handler-facing error; converts from `DomainError` with `?`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            DomainError::NotFound { entity, .. } => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(format!("{} not found", entity)),
            ),
            DomainError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_fields(BTreeMap::from([(field, vec![message])])),
            ),
            DomainError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(message))
            }
            err @ DomainError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(err.to_string()))
            }
            DomainError::ServiceUnavailable(message) => {
                error!("Service unavailable: {}", message);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("Service temporarily unavailable"),
                )
            }
            DomainError::Internal(message) => {
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
