use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    config::Config,
    constants::IPFS_FETCH_TIMEOUT_SECS,
    error::{AppError, Result},
    models::GameMetadata,
};

/// Resolves a content hash to its metadata document. Absence is routine:
/// every failure reads as `None`.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, ipfs_hash: &str) -> Option<GameMetadata>;
}

/// Public HTTP gateway, `GET <gateway>/ipfs/<hash>`. No caching.
#[derive(Debug, Clone)]
pub struct IpfsGateway {
    gateway_url: String,
    client: reqwest::Client,
}

impl IpfsGateway {
    pub fn new(gateway_url: String, client: reqwest::Client) -> Self {
        Self {
            gateway_url,
            client,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IPFS_FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("IPFS HTTP client init failed: {}", e)))?;
        Ok(Self::new(config.ipfs_gateway_url.clone(), client))
    }

    pub fn content_url(&self, ipfs_hash: &str) -> Result<Url> {
        content_url(&self.gateway_url, ipfs_hash)
    }

    /// Fetches and parses the document, keeping the failure reason.
    pub async fn try_fetch(&self, ipfs_hash: &str) -> Result<GameMetadata> {
        let hash = ipfs_hash.trim();
        if hash.is_empty() {
            return Err(AppError::BadRequest("IPFS hash is empty".to_string()));
        }

        let url = self.content_url(hash)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IPFS fetch for {} failed: {}", hash, e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalAPI(format!(
                "IPFS gateway returned {} for {}",
                response.status(),
                hash
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("IPFS body read for {} failed: {}", hash, e)))?;
        parse_metadata(&body)
    }
}

#[async_trait]
impl MetadataSource for IpfsGateway {
    async fn fetch_metadata(&self, ipfs_hash: &str) -> Option<GameMetadata> {
        if ipfs_hash.trim().is_empty() {
            return None;
        }
        match self.try_fetch(ipfs_hash).await {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                tracing::warn!("No metadata for {}: {}", ipfs_hash.trim(), e);
                None
            }
        }
    }
}

pub fn content_url(gateway_url: &str, ipfs_hash: &str) -> Result<Url> {
    Url::parse(&format!(
        "{}/ipfs/{}",
        gateway_url.trim_end_matches('/'),
        ipfs_hash.trim()
    ))
    .map_err(|e| AppError::Internal(format!("Invalid IPFS gateway URL: {}", e)))
}

fn parse_metadata(body: &[u8]) -> Result<GameMetadata> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedData(format!("metadata is not a JSON object: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> IpfsGateway {
        // Port 9 (discard) is never served; any request would fail.
        IpfsGateway::new("http://127.0.0.1:9".to_string(), reqwest::Client::new())
    }

    #[test]
    fn content_url_joins_gateway_and_hash() {
        let url = content_url("https://gateway.pinata.cloud/", " QmHash ").unwrap();
        assert_eq!(url.as_str(), "https://gateway.pinata.cloud/ipfs/QmHash");
    }

    #[tokio::test]
    async fn blank_hash_short_circuits() {
        assert!(gateway().fetch_metadata("").await.is_none());
        assert!(gateway().fetch_metadata("   ").await.is_none());
        assert!(matches!(
            gateway().try_fetch(" ").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_reads_as_no_metadata() {
        assert!(gateway().fetch_metadata("QmHash").await.is_none());
    }

    #[test]
    fn non_json_and_non_object_bodies_are_rejected() {
        assert!(parse_metadata(b"<html>504</html>").is_err());
        assert!(parse_metadata(b"[1, 2, 3]").is_err());
        let metadata = parse_metadata(br#"{"name":"Cosmic Clash"}"#).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Cosmic Clash"));
    }

    #[tokio::test]
    async fn missing_or_non_json_documents_read_as_no_metadata() {
        use axum::{http::StatusCode, routing::get, Router};

        let router = Router::new()
            .route("/ipfs/QmGood", get(|| async { r#"{"name":"Cosmic Clash"}"# }))
            .route("/ipfs/QmHtml", get(|| async { "<html>gateway timeout</html>" }))
            .route("/ipfs/QmGone", get(|| async { (StatusCode::NOT_FOUND, "not found") }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let gateway = IpfsGateway::new(format!("http://{}", addr), reqwest::Client::new());
        let found = gateway.fetch_metadata("QmGood").await.unwrap();
        assert_eq!(found.name.as_deref(), Some("Cosmic Clash"));
        assert!(gateway.fetch_metadata("QmGone").await.is_none());
        assert!(gateway.fetch_metadata("QmHtml").await.is_none());
        assert!(matches!(
            gateway.try_fetch("QmGone").await,
            Err(AppError::ExternalAPI(_))
        ));
    }
}
