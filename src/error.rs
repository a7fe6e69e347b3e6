use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::submission::SubmissionFailure;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Smart contract not configured. Please deploy the contract first.")]
    ContractNotConfigured,

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Server configuration error: {0}")]
    ServerConfig(String),

    #[error(transparent)]
    Submission(#[from] SubmissionFailure),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BlockchainRPC(_) => (StatusCode::BAD_GATEWAY, "BLOCKCHAIN_RPC_ERROR"),
            AppError::ContractNotConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONTRACT_NOT_CONFIGURED")
            }
            AppError::MalformedData(_) => (StatusCode::UNPROCESSABLE_ENTITY, "MALFORMED_DATA"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::ExternalAPI(_) => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR"),
            AppError::ServerConfig(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_CONFIG_ERROR"),
            AppError::Submission(failure) => (failure.status(), failure.code()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{} ({})", self, code);
        }

        let message = match &self {
            AppError::Submission(failure) => failure.user_message(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
