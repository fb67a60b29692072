//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! `AppJson<T>` replaces `axum::Json<T>` in handler signatures so that a malformed
//! body yields the same JSON error shape as every other failure, with status 400
//! instead of axum's plain-text 422.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

/// JSON extractor whose rejections are `AppError::Validation`.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field = field_from_serde_message(&body_text).unwrap_or_else(|| "body".to_string());

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field),
        received: None,
        docs_hint: Some(
            "Send a JSON object with Content-Type: application/json, e.g. {\"query\": \"lost my blue wallet in the library\"}. \
             The full schema is at /api-doc/openapi.json."
                .to_string(),
        ),
    }
}

/// Field name from serde's "missing field `x`" / "unknown field `x`" messages.
fn field_from_serde_message(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `"]
        .iter()
        .find_map(|marker| {
            let after = &msg[msg.find(marker)? + marker.len()..];
            after.find('`').map(|end| after[..end].to_string())
        })
}
