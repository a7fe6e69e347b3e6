use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod integrations;
mod models;
mod registry;
mod services;

use config::Config;
use constants::API_VERSION;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_registry_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting game registry backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!("Full node: {}", config.rpc_url);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let app_state = api::AppState::from_config(config)?;
    let app = build_router(app_state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    let cors = cors_from_config(&state.config);
    // Asset uploads outgrow axum's 2 MB default.
    let upload_limit = DefaultBodyLimit::max(state.config.upload_body_limit_bytes);

    Router::new()
        .route("/health", get(api::health::health_check))
        // Discovery
        .route("/api/fetch-games", get(api::games::fetch_games))
        .route("/api/discovery", get(api::games::discovery))
        .route("/api/games/{slug}", get(api::games::get_game))
        .route("/api/debug-blockchain", get(api::games::debug_blockchain))
        // Chain
        .route(
            "/api/check-transaction",
            get(api::transactions::check_transaction),
        )
        .route(
            "/api/contract-config",
            get(api::transactions::contract_config),
        )
        .route(
            "/api/transactions/{kind}",
            post(api::transactions::build_transaction),
        )
        // Pinning
        .route("/api/upload-json", post(api::upload::upload_json))
        .route(
            "/api/upload",
            post(api::upload::upload_file).layer(upload_limit.clone()),
        )
        // Submissions
        .route(
            "/api/submissions/confirm",
            post(api::submissions::confirm_submission),
        )
        .route(
            "/api/submissions/{kind}",
            post(api::submissions::prepare_submission).layer(upload_limit),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
