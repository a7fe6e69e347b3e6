use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, DecodedGame, DisplayGame},
    registry::decoder::decode_entries,
    services::game_assembly::{discovery_list, static_games},
};

#[derive(Debug, Serialize)]
pub struct FetchGamesResponse {
    pub games: Vec<DecodedGame>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResponse {
    pub games: Vec<DisplayGame>,
    pub onchain_count: usize,
    pub echo_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugBlockchainResponse {
    pub registry_id: String,
    pub timestamp: String,
    pub object: Value,
}

/// GET /api/fetch-games
///
/// Never fails: a missing registry or a failed read is an empty list.
pub async fn fetch_games(State(state): State<AppState>) -> Json<FetchGamesResponse> {
    let raw = state.reader.read_games_or_empty().await;
    Json(FetchGamesResponse {
        games: decode_entries(&raw),
    })
}

/// Decoded on-chain games, read with retry. A successful non-empty read
/// clears the submitted-game echoes. Without a registry there is nothing to
/// wait for, so no attempt is made.
async fn onchain_games(state: &AppState) -> Vec<DecodedGame> {
    if state.reader.registry_id().is_none() {
        tracing::debug!("Registry not configured; skipping on-chain discovery");
        return Vec::new();
    }
    let reader = &state.reader;
    let raw = state.retry.run_or_empty(move || reader.read_games()).await;
    if !raw.is_empty() {
        state.cache.invalidate().await;
    }
    decode_entries(&raw)
}

/// GET /api/discovery
pub async fn discovery(State(state): State<AppState>) -> Json<ApiResponse<DiscoveryResponse>> {
    let decoded = onchain_games(&state).await;
    let onchain = state.assembler.assemble(&decoded).await;
    let echoes = state.cache.snapshot().await;

    let onchain_count = onchain.len();
    let echo_count = echoes.len();
    Json(ApiResponse::success(DiscoveryResponse {
        games: discovery_list(onchain, echoes),
        onchain_count,
        echo_count,
    }))
}

/// GET /api/games/{slug}
pub async fn get_game(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<DisplayGame>>> {
    let raw = state.reader.read_games_or_empty().await;
    let decoded = decode_entries(&raw);
    if let Some(game) = state.assembler.find_by_slug(&decoded, &slug).await {
        return Ok(Json(ApiResponse::success(game)));
    }

    state
        .cache
        .snapshot()
        .await
        .into_iter()
        .chain(static_games())
        .find(|game| game.slug == slug)
        .map(|game| Json(ApiResponse::success(game)))
        .ok_or_else(|| AppError::NotFound(format!("Game '{}' not found", slug)))
}

/// GET /api/debug-blockchain
pub async fn debug_blockchain(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DebugBlockchainResponse>>> {
    let registry_id = state
        .reader
        .registry_id()
        .ok_or(AppError::ContractNotConfigured)?
        .to_string();
    let object = state
        .reader
        .read_object()
        .await?
        .ok_or(AppError::ContractNotConfigured)?;

    Ok(Json(ApiResponse::success(DebugBlockchainResponse {
        registry_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
        object,
    })))
}
