use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use lostfound_core::error::ApiError;
use lostfound_core::filter::MAX_RESULT_LIMIT;
use lostfound_core::search::SearchAssistResponse;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub const MAX_QUERY_CHARS: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ai/search", post(assist_search))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// What the user typed, e.g. "I lost my blue wallet near the library"
    pub query: String,
    /// Maximum number of items to return (1-25, server default otherwise)
    #[serde(default)]
    pub limit: Option<usize>,
}

fn validate(req: &SearchRequest) -> Result<&str, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation {
            message: "query must not be empty".to_string(),
            field: Some("query".to_string()),
            received: Some(serde_json::Value::String(req.query.clone())),
            docs_hint: Some(
                "Describe the item in plain words, e.g. 'found a black umbrella in the gym'."
                    .to_string(),
            ),
        });
    }

    let length = query.chars().count();
    if length > MAX_QUERY_CHARS {
        return Err(AppError::Validation {
            message: format!("query is {length} characters; the limit is {MAX_QUERY_CHARS}"),
            field: Some("query".to_string()),
            received: None,
            docs_hint: Some("Shorten the description to the essentials.".to_string()),
        });
    }

    if let Some(limit) = req.limit {
        if !(1..=MAX_RESULT_LIMIT).contains(&limit) {
            return Err(AppError::Validation {
                message: format!("limit must be between 1 and {MAX_RESULT_LIMIT}"),
                field: Some("limit".to_string()),
                received: Some(serde_json::Value::from(limit)),
                docs_hint: None,
            });
        }
    }

    Ok(query)
}

/// Search items in natural language
///
/// Extracts what the user lost or found, searches the opposite kind of
/// report, and phrases a short answer. Upstream failures never surface as
/// errors: the response is still 200, with `debug.fallback` or
/// `debug.degraded` set.
#[utoipa::path(
    post,
    path = "/api/ai/search",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search result", body = SearchAssistResponse),
        (status = 400, description = "Validation error", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "search"
)]
pub async fn assist_search(
    State(state): State<AppState>,
    AppJson(req): AppJson<SearchRequest>,
) -> Result<Json<SearchAssistResponse>, AppError> {
    let query = validate(&req)?;
    Ok(Json(state.assistant.search(query, req.limit).await))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::assist::SearchAssistant;
    use crate::llm::LanguageModel;
    use crate::testing::{MemoryItemStore, Script, ScriptedModel, sample_items};

    fn app(store: MemoryItemStore) -> Router {
        let store = Arc::new(store);
        let model: Arc<dyn LanguageModel> =
            Arc::new(ScriptedModel::new(Script::Fail, Script::Fail));
        let state = AppState {
            store: store.clone(),
            assistant: Arc::new(SearchAssistant::new(
                store,
                Some(model),
                10,
                Duration::from_millis(50),
            )),
        };
        router().with_state(state)
    }

    async fn post_search(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai/search")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        (status, serde_json::from_slice(&bytes).expect("body is json"))
    }

    #[tokio::test]
    async fn failing_model_still_returns_well_formed_result() {
        let (status, body) = post_search(
            app(MemoryItemStore::new(sample_items())),
            serde_json::json!({"query": "  I LOST my wallet at the library "}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].is_string());
        assert_eq!(body["debug"]["fallback"], true);
        assert_eq!(body["debug"]["degraded"], false);
        assert_eq!(body["debug"]["intentSource"], "fallback");
        assert_eq!(body["debug"]["searchStatus"], "found");
        assert_eq!(body["debug"]["location"], "library");
        let results = body["results"].as_array().expect("results is an array");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["title"], "Blue wallet");
        assert_eq!(results[0]["location"], "Main Library");
    }

    #[tokio::test]
    async fn unavailable_store_is_still_200_with_degraded_message() {
        let (status, body) = post_search(
            app(MemoryItemStore::unavailable()),
            serde_json::json!({"query": "found keys"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["debug"]["degraded"], true);
        assert_eq!(
            body["message"],
            lostfound_core::search::messages::SERVICE_DEGRADED
        );
        assert_eq!(body["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let (status, body) = post_search(
            app(MemoryItemStore::new(sample_items())),
            serde_json::json!({"query": "   "}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "query");
    }

    #[tokio::test]
    async fn oversized_query_and_bad_limit_are_rejected() {
        let (status, body) = post_search(
            app(MemoryItemStore::new(sample_items())),
            serde_json::json!({"query": "x".repeat(MAX_QUERY_CHARS + 1)}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "query");

        let (status, body) = post_search(
            app(MemoryItemStore::new(sample_items())),
            serde_json::json!({"query": "wallet", "limit": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "limit");
    }
}
