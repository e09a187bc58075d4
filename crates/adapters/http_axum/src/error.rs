//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use taskhook_domain::error::{TaskhookError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`TaskhookError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(TaskhookError);

impl From<TaskhookError> for ApiError {
    fn from(err: TaskhookError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TaskhookError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            TaskhookError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            TaskhookError::Storage(_) => {
                tracing::error!(error = %taskhook_app::error_chain(&self.0), "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
