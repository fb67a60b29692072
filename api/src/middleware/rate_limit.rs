use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use axum::response::IntoResponse;
use lostfound_core::error::{ApiError, codes};
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

type RateLimitLayer = GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, Body>;

/// Rate limit for POST /api/ai/search: 30 requests/minute per IP.
/// Every search may cost two language-model calls.
pub fn search_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(2) // 30 per minute = 1 per 2 seconds replenish
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for search"),
    )
    .error_handler(json_error_handler)
}

/// Returns an `ApiError` body, plus Retry-After when the wait is known.
fn json_error_handler(err: GovernorError) -> Response<Body> {
    let (status, code, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            codes::RATE_LIMITED,
            Some(wait_time),
            format!("Too many searches. Retry after {wait_time} seconds."),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            None,
            "Unable to determine client identity for rate limiting".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => {
            (code, codes::INTERNAL_ERROR, None, msg.unwrap_or_default())
        }
    };

    let body = ApiError {
        error: code.to_string(),
        message,
        field: None,
        received: None,
        request_id: uuid::Uuid::now_v7().to_string(),
        docs_hint: None,
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(seconds) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    }
    response
}
