//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use surveydoc_core::error::{AppError, ErrorKind};
use surveydoc_service::VersioningError;

/// Message shown when an update lost the race against another writer.
pub const CONFLICT_MESSAGE: &str = "document was updated by someone else, please retry";

/// Message shown when content could not be stored.
pub const SAVE_FAILED_MESSAGE: &str = "failed to save document";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<VersioningError> for ApiError {
    fn from(err: VersioningError) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    fn versioning_cause(&self) -> Option<&VersioningError> {
        self.0.source.as_deref()?.downcast_ref::<VersioningError>()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind;
        let (status, error_code) = match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match self.versioning_cause() {
            Some(VersioningError::VersionConflict { .. }) => CONFLICT_MESSAGE.to_string(),
            Some(
                VersioningError::UploadFailed { .. } | VersioningError::TransactionFailed(_),
            ) => {
                tracing::error!(error = %self.0, "Document save failed");
                SAVE_FAILED_MESSAGE.to_string()
            }
            // Backend details stay in the log.
            _ if kind.is_server_fault() => {
                tracing::error!(error = %self.0, kind = %kind, "Internal server error");
                "internal server error".to_string()
            }
            _ => self.0.message.clone(),
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
