use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::{
    constants::OCT_BASE_UNITS,
    error::{AppError, Result},
    models::{ApiResponse, SubmissionKind},
    registry::rpc_client::TransactionBlockOptions,
    services::{submission::execution_status_of, transaction_builder::SubmissionTransaction},
};

#[derive(Debug, Deserialize)]
pub struct CheckTransactionQuery {
    pub digest: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckTransactionResponse {
    pub digest: String,
    pub status: Option<String>,
    pub error: Option<String>,
    pub object_changes: Value,
    pub events: Value,
    pub raw_response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractConfigResponse {
    pub package_id: Option<String>,
    pub registry_id: Option<String>,
    pub clock_id: String,
    pub game_fee: u64,
    pub game_fee_oct: f64,
    pub project_fee: u64,
    pub project_fee_oct: f64,
    pub configured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTransactionRequest {
    pub ipfs_hash: String,
    pub name: String,
}

pub(crate) fn parse_kind(raw: &str) -> Result<SubmissionKind> {
    SubmissionKind::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown submission kind '{}'", raw)))
}

/// GET /api/check-transaction?digest=
pub async fn check_transaction(
    State(state): State<AppState>,
    Query(query): Query<CheckTransactionQuery>,
) -> Result<Json<ApiResponse<CheckTransactionResponse>>> {
    let digest = query
        .digest
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::BadRequest("Transaction digest is required".to_string()))?;

    let block = state
        .rpc
        .get_transaction_block(&digest, TransactionBlockOptions::default())
        .await?;
    let status = execution_status_of(&block);

    Ok(Json(ApiResponse::success(CheckTransactionResponse {
        digest,
        status: status.as_ref().map(|s| s.status.clone()),
        error: status.and_then(|s| s.error),
        object_changes: block.get("objectChanges").cloned().unwrap_or(Value::Null),
        events: block.get("events").cloned().unwrap_or(Value::Null),
        raw_response: block,
    })))
}

/// GET /api/contract-config
pub async fn contract_config(State(state): State<AppState>) -> Json<ApiResponse<ContractConfigResponse>> {
    let contract = state.config.contract();
    let oct = |fee: u64| fee as f64 / OCT_BASE_UNITS as f64;
    Json(ApiResponse::success(ContractConfigResponse {
        package_id: contract.package_id().map(str::to_string),
        registry_id: contract.registry_id().map(str::to_string),
        clock_id: contract.clock_id.clone(),
        game_fee: contract.game_fee,
        game_fee_oct: oct(contract.game_fee),
        project_fee: contract.project_fee,
        project_fee_oct: oct(contract.project_fee),
        configured: contract.is_configured(),
    }))
}

/// POST /api/transactions/{kind}
pub async fn build_transaction(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<BuildTransactionRequest>,
) -> Result<Json<ApiResponse<SubmissionTransaction>>> {
    let kind = parse_kind(&kind)?;
    let transaction = state
        .transaction_builder()
        .build(kind, &req.ipfs_hash, &req.name)?;
    Ok(Json(ApiResponse::success(transaction)))
}
