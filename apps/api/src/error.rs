//! Error types for the API, and the JSON envelopes every response uses.
//!
//! ```text
//! success  {"success": true,  "data": ..., "message"?: "..."}
//! failure  {"success": false, "message": "...", "error"?: "conflict"}
//! ```
//!
//! ## Status mapping
//! ```text
//! Validation, InvalidState, Conflict → 400
//! Unauthorized                       → 401
//! Forbidden                          → 403
//! NotFound                           → 404
//! Unexpected                         → 500 (generic message, detail logged)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stayhub_core::{CoreError, ErrorKind, ValidationError};
use stayhub_db::{DbError, ServiceError};
use tracing::{error, warn};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The request body or query string could not be read.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::InvalidState | ErrorKind::Conflict => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code for the `error` field.
    fn code(&self) -> &'static str {
        match self {
            ApiError::Service(e) if e.is_retryable() => "retryable",
            ApiError::Service(e) => match e.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::NotFound => "not_found",
                ErrorKind::InvalidState => "invalid_state",
                ErrorKind::Conflict => "conflict",
                ErrorKind::Forbidden => "forbidden",
                ErrorKind::Unexpected => "unexpected",
            },
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InvalidRequest(_) => "validation",
            ApiError::Internal(_) => "unexpected",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::Service(e.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Service(e.into())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        ApiError::Service(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "An unexpected error occurred".to_string()
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
            match &self {
                ApiError::Unauthorized(msg) | ApiError::InvalidRequest(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            error: Some(self.code()),
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Success Envelope
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
