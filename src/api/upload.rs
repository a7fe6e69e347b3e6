use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::Value;

use super::AppState;
use crate::{
    error::{AppError, Result},
    integrations::pinata::{FileUpload, PinnedContent},
    models::ApiResponse,
};

/// Reads one multipart field into an upload.
pub(crate) async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<FileUpload> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
    Ok(FileUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    })
}

/// POST /api/upload-json
pub async fn upload_json(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<Json<ApiResponse<PinnedContent>>> {
    let pinned = state.pinner.pin_json(&document).await?;
    Ok(Json(ApiResponse::success(pinned)))
}

/// POST /api/upload
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<PinnedContent>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file = read_file(field).await?;
            let pinned = state.pinner.pin_file(file).await?;
            return Ok(Json(ApiResponse::success(pinned)));
        }
    }
    Err(AppError::BadRequest("No file provided".to_string()))
}
