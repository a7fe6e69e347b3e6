use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, Result},
    integrations::ipfs::content_url,
};

/// A file to pin.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedContent {
    pub hash: String,
    pub url: String,
}

/// Upload bytes or a JSON document, get back a content hash.
#[async_trait]
pub trait ContentPinner: Send + Sync {
    async fn pin_file(&self, file: FileUpload) -> Result<PinnedContent>;

    async fn pin_json(&self, document: &Value) -> Result<PinnedContent>;
}

#[derive(Debug, Deserialize)]
struct PinataPinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[derive(Debug, Clone)]
pub struct PinataClient {
    api_url: String,
    gateway_url: String,
    jwt: Option<String>,
    client: reqwest::Client,
}

impl PinataClient {
    pub fn new(api_url: String, gateway_url: String, jwt: Option<String>) -> Self {
        Self {
            api_url,
            gateway_url,
            jwt,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.pinata_api_url.clone(),
            config.ipfs_gateway_url.clone(),
            config.pinata_jwt.clone(),
        )
    }

    // Uploads cannot proceed without the server-side credential.
    fn bearer(&self) -> Result<&str> {
        self.jwt
            .as_deref()
            .map(str::trim)
            .filter(|jwt| !jwt.is_empty())
            .ok_or_else(|| {
                tracing::error!("PINATA_JWT environment variable is not configured");
                AppError::ServerConfig("PINATA_JWT not set".to_string())
            })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/pinning/{}", self.api_url.trim_end_matches('/'), path)
    }

    async fn finish(&self, response: reqwest::Response) -> Result<PinnedContent> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Pinata API error: status={} body={}", status, body);
            return Err(AppError::ExternalAPI(format!(
                "Failed to upload to Pinata. Status: {} - {}",
                status, body
            )));
        }

        let pinned: PinataPinResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Pinata response parse failed: {}", e)))?;
        let url = content_url(&self.gateway_url, &pinned.ipfs_hash)?;
        tracing::info!("Uploaded to IPFS: {}", url);
        Ok(PinnedContent {
            hash: pinned.ipfs_hash,
            url: url.to_string(),
        })
    }
}

/// Display name Pinata stores with a JSON pin.
pub fn pin_name(document: &Value) -> String {
    ["name", "projectName"]
        .iter()
        .find_map(|key| document.get(*key).and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("metadata")
        .to_string()
}

#[async_trait]
impl ContentPinner for PinataClient {
    async fn pin_file(&self, file: FileUpload) -> Result<PinnedContent> {
        let jwt = self.bearer()?;
        tracing::info!(
            "Uploading file to Pinata: {} ({} bytes)",
            file.file_name,
            file.bytes.len()
        );

        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::BadRequest(format!("Invalid content type: {}", e)))?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("pinFileToIPFS"))
            .bearer_auth(jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Pinata file upload failed: {}", e)))?;
        self.finish(response).await
    }

    async fn pin_json(&self, document: &Value) -> Result<PinnedContent> {
        let jwt = self.bearer()?;
        if document.is_null() {
            return Err(AppError::BadRequest("No data provided".to_string()));
        }

        let body = serde_json::json!({
            "pinataContent": document,
            "pinataMetadata": { "name": pin_name(document) }
        });
        let response = self
            .client
            .post(self.endpoint("pinJSONToIPFS"))
            .bearer_auth(jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Pinata JSON upload failed: {}", e)))?;
        self.finish(response).await
    }
}
