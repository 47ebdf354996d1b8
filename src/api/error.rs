use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::OrderError;
use crate::models::{FieldIssue, Resource};

/// Error kinds surfaced by the HTTP API.
///
/// Every variant renders as `{"error": ...}`; validation errors also carry
/// a `details` array of field-level problems. Internal errors are logged
/// where they are created and never leak their cause to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body")]
    Validation(Vec<FieldIssue>),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldIssue::new(path, message)])
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a failed reorder batch onto the API error kinds.
    pub fn from_order(resource: Resource, err: OrderError) -> Self {
        match err {
            OrderError::NotFound { .. } => {
                tracing::warn!("Reorder rejected: {}", err);
                Self::NotFound(err.to_string())
            }
            OrderError::Forbidden { .. } => {
                tracing::warn!("Reorder rejected: {}", err);
                Self::Forbidden(err.to_string())
            }
            OrderError::Storage(e) => {
                tracing::error!("Failed to update {} order: {}", resource, e);
                Self::Internal(format!("Failed in updating {} order", resource))
            }
        }
    }
}

/// Unexpected store failures: log the cause, return an opaque message.
impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:#}", e);
        Self::Internal("Internal server error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(details) => serde_json::json!({
                "error": "Invalid request body",
                "details": details,
            }),
            other => serde_json::json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
