//! Game / project submission flow.
//!
//! ```text
//! Idle -> UploadingAssets -> UploadingMetadata -> BuildingTransaction
//!      -> AwaitingSignature -> Confirming -> Succeeded
//! ```
//!
//! Any non-terminal state may move to `Failed`. Terminal states accept no
//! further transitions; a retry starts a new flow at `Idle`.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    constants::{DEFAULT_BUTTON, DEFAULT_STATUS, DEFAULT_XP, OCT_BASE_UNITS},
    error::{AppError, Result},
    integrations::pinata::{ContentPinner, FileUpload},
    models::{GameMetadata, SubmissionKind},
    registry::rpc_client::{RpcClient, TransactionBlockOptions},
    services::transaction_builder::{SubmissionTransaction, TransactionBuilder},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SubmissionFailure {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Transaction could not be built: {0}")]
    Build(String),

    #[error("Insufficient balance for a {required} base-unit fee")]
    InsufficientBalance { required: u64 },

    #[error("Transaction cancelled by user")]
    CancelledByUser,

    #[error("Transaction failed: No transaction digest")]
    MissingDigest,

    #[error("Transaction failed on chain: {0}")]
    TransactionFailed(String),

    #[error("Transaction could not be verified: {0}")]
    Unverified(String),

    #[error("Wallet error: {0}")]
    Wallet(String),
}

impl SubmissionFailure {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Upload(_) => StatusCode::BAD_GATEWAY,
            Self::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Upload(_) => "UPLOAD_FAILED",
            Self::Build(_) => "BUILD_FAILED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::CancelledByUser => "CANCELLED_BY_USER",
            Self::MissingDigest => "MISSING_DIGEST",
            Self::TransactionFailed(_) => "TRANSACTION_FAILED",
            Self::Unverified(_) => "TRANSACTION_UNVERIFIED",
            Self::Wallet(_) => "WALLET_ERROR",
        }
    }

    /// Text shown to the user, with what to do next.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientBalance { required } => format!(
                "Insufficient OCT balance. Please ensure you have at least {} OCT plus gas fees.",
                *required as f64 / OCT_BASE_UNITS as f64
            ),
            Self::CancelledByUser => "Transaction cancelled by user.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Maps a raw wallet error message to a failure the user can act on.
pub fn classify_wallet_error(message: &str, fee: u64) -> SubmissionFailure {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient") {
        SubmissionFailure::InsufficientBalance { required: fee }
    } else if lower.contains("user rejected") || lower.contains("rejected by user") {
        SubmissionFailure::CancelledByUser
    } else {
        SubmissionFailure::Wallet(message.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    UploadingAssets,
    UploadingMetadata,
    BuildingTransaction,
    AwaitingSignature,
    Confirming,
    Succeeded { digest: String },
    Failed { failure: SubmissionFailure },
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }

    fn step(&self) -> Option<u8> {
        match self {
            Self::Idle => Some(0),
            Self::UploadingAssets => Some(1),
            Self::UploadingMetadata => Some(2),
            Self::BuildingTransaction => Some(3),
            Self::AwaitingSignature => Some(4),
            Self::Confirming => Some(5),
            Self::Succeeded { .. } => Some(6),
            Self::Failed { .. } => None,
        }
    }

    fn can_advance_to(&self, next: &SubmissionState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, Self::Failed { .. }) {
            return true;
        }
        matches!((self.step(), next.step()), (Some(from), Some(to)) if to == from + 1)
    }
}

/// Wallet answer after a signing request: a digest, an error message, or
/// neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOutcome {
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Signs and submits a transaction. Browser wallets sign client-side and
/// answer through [`SubmissionFlow::confirm`]; this drives in-process signers.
#[cfg(test)]
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_and_execute(&self, transaction: &SubmissionTransaction) -> WalletOutcome;
}

/// Execution status of a submitted transaction, `None` when the node does
/// not report one yet.
#[async_trait]
pub trait TransactionStatusSource: Send + Sync {
    async fn execution_status(&self, digest: &str) -> Result<Option<ExecutionStatus>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

pub fn execution_status_of(transaction_block: &Value) -> Option<ExecutionStatus> {
    transaction_block
        .pointer("/effects/status")
        .and_then(|status| serde_json::from_value(status.clone()).ok())
}

#[async_trait]
impl TransactionStatusSource for RpcClient {
    async fn execution_status(&self, digest: &str) -> Result<Option<ExecutionStatus>> {
        let block = self
            .get_transaction_block(digest, TransactionBlockOptions::default())
            .await?;
        Ok(execution_status_of(&block))
    }
}

/// Form input for one submission.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub kind: SubmissionKind,
    pub name: String,
    pub details: GameMetadata,
    pub logo: Option<FileUpload>,
    pub asset: Option<FileUpload>,
}

impl SubmissionRequest {
    pub fn validate(&self) -> Result<()> {
        let missing = |value: &Option<String>| value.as_deref().map_or(true, |v| v.trim().is_empty());

        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{} name is required", self.kind.label())));
        }
        if missing(&self.details.description) {
            return Err(AppError::BadRequest("Please fill in all required fields".to_string()));
        }
        if self.kind == SubmissionKind::Game {
            if missing(&self.details.genre) || missing(&self.details.website_url) {
                return Err(AppError::BadRequest("Please fill in all required fields".to_string()));
            }
            if self.logo.is_none() || self.asset.is_none() {
                return Err(AppError::BadRequest(
                    "Please upload both logo and game asset".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Everything the wallet step needs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedSubmission {
    pub kind: SubmissionKind,
    pub name: String,
    pub metadata: GameMetadata,
    pub metadata_hash: String,
    pub metadata_url: String,
    pub transaction: SubmissionTransaction,
}

#[derive(Debug, Clone)]
pub struct SubmissionFlow {
    state: SubmissionState,
    history: Vec<SubmissionState>,
}

impl Default for SubmissionFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionFlow {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            history: vec![SubmissionState::Idle],
        }
    }

    /// Picks up a flow whose transaction was handed to a wallet earlier.
    pub fn awaiting_signature() -> Self {
        Self {
            state: SubmissionState::AwaitingSignature,
            history: vec![SubmissionState::AwaitingSignature],
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn history(&self) -> &[SubmissionState] {
        &self.history
    }

    fn advance(&mut self, next: SubmissionState) -> Result<()> {
        if !self.state.can_advance_to(&next) {
            return Err(AppError::Internal(format!(
                "Illegal submission transition {:?} -> {:?}",
                self.state, next
            )));
        }
        tracing::debug!("Submission {:?} -> {:?}", self.state, next);
        self.state = next.clone();
        self.history.push(next);
        Ok(())
    }

    fn fail(&mut self, failure: SubmissionFailure) {
        tracing::warn!("Submission failed: {}", failure);
        let failed = SubmissionState::Failed { failure };
        if self.state.can_advance_to(&failed) {
            self.state = failed.clone();
            self.history.push(failed);
        }
    }

    async fn pin_file(
        &mut self,
        pinner: &dyn ContentPinner,
        file: Option<FileUpload>,
    ) -> Result<Option<String>> {
        let Some(file) = file else {
            return Ok(None);
        };
        match pinner.pin_file(file).await {
            Ok(pinned) => Ok(Some(pinned.url)),
            Err(e) => {
                self.fail(SubmissionFailure::Upload(e.to_string()));
                Err(e)
            }
        }
    }

    /// Uploads the assets and the metadata document, then builds the
    /// unsigned transaction. Leaves the flow in `AwaitingSignature`.
    pub async fn prepare(
        &mut self,
        pinner: &dyn ContentPinner,
        builder: &TransactionBuilder,
        request: SubmissionRequest,
    ) -> Result<PreparedSubmission> {
        request.validate()?;
        let SubmissionRequest {
            kind,
            name,
            details,
            logo,
            asset,
        } = request;
        let name = name.trim().to_string();

        self.advance(SubmissionState::UploadingAssets)?;
        let logo_url = self.pin_file(pinner, logo).await?;
        let video_url = self.pin_file(pinner, asset).await?;

        self.advance(SubmissionState::UploadingMetadata)?;
        let metadata = submission_metadata(kind, &name, details, logo_url, video_url);
        let document = serde_json::to_value(&metadata)
            .map_err(|e| AppError::Internal(format!("Metadata serialization failed: {}", e)))?;
        let pinned = match pinner.pin_json(&document).await {
            Ok(pinned) => pinned,
            Err(e) => {
                self.fail(SubmissionFailure::Upload(e.to_string()));
                return Err(e);
            }
        };

        self.advance(SubmissionState::BuildingTransaction)?;
        let transaction = match builder.build(kind, &pinned.hash, &name) {
            Ok(transaction) => transaction,
            Err(e) => {
                self.fail(SubmissionFailure::Build(e.to_string()));
                return Err(e);
            }
        };

        tracing::info!(
            "Prepared {} submission '{}' ({} OCT)",
            kind.label(),
            name,
            transaction.fee_in_oct()
        );
        self.advance(SubmissionState::AwaitingSignature)?;
        Ok(PreparedSubmission {
            kind,
            name,
            metadata,
            metadata_hash: pinned.hash,
            metadata_url: pinned.url,
            transaction,
        })
    }

    /// Applies the wallet's answer. Succeeds only when the node reports a
    /// successful execution for the returned digest.
    pub async fn confirm(
        &mut self,
        outcome: WalletOutcome,
        fee: u64,
        status_source: &dyn TransactionStatusSource,
    ) -> Result<String> {
        if let Some(message) = outcome.error.as_deref().filter(|m| !m.trim().is_empty()) {
            let failure = classify_wallet_error(message, fee);
            self.fail(failure.clone());
            return Err(failure.into());
        }

        self.advance(SubmissionState::Confirming)?;
        let Some(digest) = outcome
            .digest
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
        else {
            self.fail(SubmissionFailure::MissingDigest);
            return Err(SubmissionFailure::MissingDigest.into());
        };

        let failure = match status_source.execution_status(&digest).await {
            Ok(Some(status)) if status.is_success() => None,
            Ok(Some(status)) => Some(SubmissionFailure::TransactionFailed(
                status.error.unwrap_or(status.status),
            )),
            Ok(None) => Some(SubmissionFailure::Unverified(format!(
                "no execution status for {}",
                digest
            ))),
            Err(e) => Some(SubmissionFailure::Unverified(e.to_string())),
        };
        if let Some(failure) = failure {
            self.fail(failure.clone());
            return Err(failure.into());
        }

        tracing::info!("Transaction succeeded! Digest: {}", digest);
        self.advance(SubmissionState::Succeeded {
            digest: digest.clone(),
        })?;
        Ok(digest)
    }

    /// Drives an in-process signer for a prepared submission.
    #[cfg(test)]
    pub async fn sign_and_confirm(
        &mut self,
        signer: &dyn TransactionSigner,
        prepared: &PreparedSubmission,
        status_source: &dyn TransactionStatusSource,
    ) -> Result<String> {
        let outcome = signer.sign_and_execute(&prepared.transaction).await;
        self.confirm(outcome, prepared.transaction.fee, status_source)
            .await
    }
}

/// The metadata document pinned for a submission, with display defaults.
pub fn submission_metadata(
    kind: SubmissionKind,
    name: &str,
    details: GameMetadata,
    logo_url: Option<String>,
    video_url: Option<String>,
) -> GameMetadata {
    let (display_name, project_name) = match kind {
        SubmissionKind::Game => (Some(name.to_string()), None),
        SubmissionKind::Project => (None, Some(name.to_string())),
    };
    GameMetadata {
        name: display_name,
        project_name,
        logo_url: logo_url.or(details.logo_url),
        video_url: video_url.or(details.video_url),
        status: details.status.or_else(|| Some(DEFAULT_STATUS.to_string())),
        xp: details.xp.or_else(|| Some(DEFAULT_XP.to_string())),
        button: details.button.or_else(|| Some(DEFAULT_BUTTON.to_string())),
        created_at: Some(chrono::Utc::now().to_rfc3339()),
        ..details
    }
}
