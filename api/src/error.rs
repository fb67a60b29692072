use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lostfound_core::error::{self, ApiError};

/// Internal error type that converts to structured API responses.
///
/// Search itself never fails once a request is accepted; only request
/// validation reaches the client as an error.
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
        };

        (status, Json(api_error)).into_response()
    }
}
