use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub rpc_url: String,
    pub contract_configured: bool,
    pub pinning_configured: bool,
    pub submitted_echoes: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        rpc_url: state.rpc.rpc_url().to_string(),
        contract_configured: state.config.contract().is_configured(),
        pinning_configured: state.config.pinata_jwt.is_some(),
        submitted_echoes: state.cache.len().await,
    })
}
