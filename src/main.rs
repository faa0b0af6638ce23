use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use concierge::config::AppConfig;
use concierge::db;
use concierge::handlers;
use concierge::services::ai::ProviderRegistry;
use concierge::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let providers =
        ProviderRegistry::from_config(Duration::from_secs(config.provider_timeout_secs))?;

    if config.openai_api_key.is_empty() && config.gemini_api_key.is_empty() {
        tracing::warn!(
            "no system API keys configured; requests will only work for users with their own key"
        );
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        providers,
    });

    // The chat UI is served from another origin; the endpoint is open to all.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/concierge", post(handlers::chat::concierge_chat))
        .route(
            "/api/profiles/:user_id",
            get(handlers::profiles::get_profile).put(handlers::profiles::update_profile),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
