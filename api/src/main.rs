use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod assist;
mod config;
mod error;
mod extract;
mod llm;
mod middleware;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use crate::assist::SearchAssistant;
use crate::config::AppConfig;
use crate::llm::{GeminiClient, LanguageModel};
use crate::store::{ItemStore, PgItemStore};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lost & Found API",
        version = "0.1.0",
        description = "Natural-language search over the campus lost and found board."
    ),
    paths(routes::health::health_check, routes::search::assist_search),
    components(schemas(
        HealthResponse,
        routes::search::SearchRequest,
        lostfound_core::error::ApiError,
        lostfound_core::items::Item,
        lostfound_core::items::ItemStatus,
        lostfound_core::intent::SearchIntent,
        lostfound_core::search::SearchAssistResponse,
        lostfound_core::search::SearchDebug,
        lostfound_core::search::IntentSource,
        lostfound_core::search::ReplySource,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether the item database answered
    pub database: bool,
    /// Whether a language model is configured
    pub language_model: bool,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lostfound_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "lostfound-api failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.skip_migrations {
        tracing::info!("skipping migrations (LOSTFOUND_SKIP_MIGRATIONS=true)");
    } else {
        sqlx::migrate!("../migrations").run(&pool).await?;
    }

    let model: Option<Arc<dyn LanguageModel>> = match &config.gemini {
        Some(gemini) => match GeminiClient::new(gemini, config.model_timeout) {
            Ok(client) => {
                tracing::info!(model = %gemini.model, "language model enabled");
                Some(Arc::new(client))
            }
            Err(err) => {
                tracing::error!(error = %err, "language model disabled: client setup failed");
                None
            }
        },
        None => {
            tracing::warn!("GEMINI_API_KEY not set; search will use the offline extractor only");
            None
        }
    };

    let store: Arc<dyn ItemStore> = Arc::new(PgItemStore::new(pool));
    let assistant = SearchAssistant::new(
        store.clone(),
        model,
        config.search_limit,
        config.model_timeout,
    );
    let app_state = state::AppState {
        store,
        assistant: Arc::new(assistant),
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::search::router().layer(middleware::rate_limit::search_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Lost & Found API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
