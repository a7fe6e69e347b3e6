use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{transactions::parse_kind, upload::read_file, AppState};
use crate::{
    error::{AppError, Result},
    integrations::pinata::FileUpload,
    models::{ApiResponse, ChainTimestamp, DecodedGame, DisplayGame, GameMetadata, SubmissionKind},
    services::{
        game_assembly::display_game,
        submission::{
            PreparedSubmission, SubmissionFlow, SubmissionRequest, SubmissionState, WalletOutcome,
        },
    },
};

const NAME_FIELDS: &[&str] = &["name", "gameName", "projectName"];
const ASSET_FIELDS: &[&str] = &["asset", "gameAsset", "video"];

/// Text fields and files of a submission form, keyed by field name.
#[derive(Debug, Default)]
pub(crate) struct SubmissionForm {
    fields: HashMap<String, String>,
    files: HashMap<String, FileUpload>,
}

impl SubmissionForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if field.file_name().is_some() {
                form.files.insert(name, read_file(field).await?);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field '{}': {}", name, e)))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn take_file(&mut self, keys: &[&str]) -> Option<FileUpload> {
        keys.iter().find_map(|key| self.files.remove(*key))
    }

    pub(crate) fn into_request(mut self, kind: SubmissionKind) -> SubmissionRequest {
        let platforms = self.text(&["platforms"]).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        SubmissionRequest {
            kind,
            name: self.text(NAME_FIELDS).unwrap_or_default(),
            details: GameMetadata {
                description: self.text(&["description"]),
                genre: self.text(&["genre"]),
                platforms,
                release_date: self.text(&["releaseDate"]),
                website_url: self.text(&["websiteUrl", "website"]),
                ..GameMetadata::default()
            },
            logo: self.take_file(&["logo"]),
            asset: self.take_file(ASSET_FIELDS),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSubmissionResponse {
    pub state: SubmissionState,
    pub history: Vec<SubmissionState>,
    pub submission: PreparedSubmission,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubmissionRequest {
    pub kind: SubmissionKind,
    pub name: String,
    pub metadata_hash: String,
    #[serde(default)]
    pub metadata: GameMetadata,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(flatten)]
    pub outcome: WalletOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmSubmissionResponse {
    pub state: SubmissionState,
    pub history: Vec<SubmissionState>,
    pub game: DisplayGame,
}

/// POST /api/submissions/{kind}
///
/// Uploads the assets and metadata, then returns the unsigned transaction
/// for the wallet.
pub async fn prepare_submission(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<PrepareSubmissionResponse>>> {
    let kind = parse_kind(&kind)?;
    if !state.config.contract().is_configured() {
        return Err(AppError::ContractNotConfigured);
    }

    let request = SubmissionForm::read(multipart).await?.into_request(kind);
    let mut flow = SubmissionFlow::new();
    let submission = flow
        .prepare(state.pinner.as_ref(), &state.transaction_builder(), request)
        .await?;

    Ok(Json(ApiResponse::success(PrepareSubmissionResponse {
        state: flow.state().clone(),
        history: flow.history().to_vec(),
        submission,
    })))
}

/// POST /api/submissions/confirm
///
/// Applies the wallet's answer and, once the node reports the transaction
/// as executed, shows the submission in discovery until the registry read
/// includes it.
pub async fn confirm_submission(
    State(state): State<AppState>,
    Json(req): Json<ConfirmSubmissionRequest>,
) -> Result<Json<ApiResponse<ConfirmSubmissionResponse>>> {
    if !state.config.contract().is_configured() {
        return Err(AppError::ContractNotConfigured);
    }
    let fee = state.transaction_builder().fee_for(req.kind);

    let mut flow = SubmissionFlow::awaiting_signature();
    let digest = flow
        .confirm(req.outcome, fee, state.status_source.as_ref())
        .await?;

    let record = DecodedGame {
        developer: req.developer.unwrap_or_default(),
        name: req.name,
        metadata_ipfs_hash: req.metadata_hash,
        submitted_at: Some(ChainTimestamp::Number(
            chrono::Utc::now().timestamp_millis().max(0) as u64,
        )),
        submission_type: match req.kind {
            SubmissionKind::Game => 0,
            SubmissionKind::Project => 1,
        },
    };
    let mut game = display_game(&record, req.metadata);
    game.tx_digest = Some(digest);
    state.cache.record(game.clone()).await;

    Ok(Json(ApiResponse::success(ConfirmSubmissionResponse {
        state: flow.state().clone(),
        history: flow.history().to_vec(),
        game,
    })))
}
