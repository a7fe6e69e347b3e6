use std::env;

use crate::constants::{
    DEFAULT_CLOCK_ID, DEFAULT_DISCOVERY_RETRIES, DEFAULT_DISCOVERY_RETRY_DELAY_MS,
    DEFAULT_IPFS_GATEWAY_URL, DEFAULT_PINATA_API_URL, DEFAULT_RPC_TIMEOUT_SECS, DEFAULT_RPC_URL,
    DEFAULT_UPLOAD_BODY_LIMIT_BYTES,
    GAME_SUBMISSION_FEE, PLACEHOLDER_PACKAGE_ID, PLACEHOLDER_REGISTRY_ID, PROJECT_SUBMISSION_FEE,
};

/// Which path the registry reader takes to reach the full node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryTransportKind {
    /// Raw JSON-RPC issued by this server.
    Proxy,
    /// Structured `get_object` calls through an RPC session.
    Session,
}

impl RegistryTransportKind {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "proxy" => Ok(Self::Proxy),
            "session" => Ok(Self::Session),
            other => anyhow::bail!("Unknown REGISTRY_TRANSPORT '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Blockchain
    pub rpc_url: String,
    pub rpc_accept_invalid_certs: bool,
    pub rpc_timeout_secs: u64,
    pub registry_transport: RegistryTransportKind,

    // Contract
    pub package_id: Option<String>,
    pub registry_id: Option<String>,
    pub clock_id: String,
    pub game_fee: u64,
    pub project_fee: u64,

    // IPFS
    pub ipfs_gateway_url: String,
    pub pinata_api_url: String,
    pub pinata_jwt: Option<String>,
    pub upload_body_limit_bytes: usize,

    // Discovery
    pub discovery_retries: u32,
    pub discovery_retry_delay_ms: u64,

    // CORS
    pub cors_allowed_origins: String,
}

/// Contract addresses and fees handed to the registry reader and the
/// transaction builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractConfig {
    pub package_id: Option<String>,
    pub registry_id: Option<String>,
    pub clock_id: String,
    pub game_fee: u64,
    pub project_fee: u64,
}

impl ContractConfig {
    pub fn registry_id(&self) -> Option<&str> {
        self.registry_id
            .as_deref()
            .filter(|id| is_deployed_id(id, PLACEHOLDER_REGISTRY_ID))
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package_id
            .as_deref()
            .filter(|id| is_deployed_id(id, PLACEHOLDER_PACKAGE_ID))
    }

    /// False until both the package and the registry object are known.
    pub fn is_configured(&self) -> bool {
        self.package_id().is_some() && self.registry_id().is_some()
    }
}

fn is_deployed_id(id: &str, placeholder: &str) -> bool {
    let id = id.trim();
    !id.is_empty() && id != placeholder
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
        })
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            rpc_url: env_non_empty("ONECHAIN_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            rpc_accept_invalid_certs: env_flag("RPC_ACCEPT_INVALID_CERTS", true),
            rpc_timeout_secs: env::var("RPC_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_RPC_TIMEOUT_SECS.to_string())
                .parse()?,
            registry_transport: RegistryTransportKind::parse(
                &env::var("REGISTRY_TRANSPORT").unwrap_or_default(),
            )?,

            package_id: env_non_empty("PACKAGE_ID"),
            registry_id: env_non_empty("REGISTRY_ID"),
            clock_id: env_non_empty("CLOCK_ID").unwrap_or_else(|| DEFAULT_CLOCK_ID.to_string()),
            game_fee: env::var("GAME_FEE")
                .unwrap_or_else(|_| GAME_SUBMISSION_FEE.to_string())
                .parse()?,
            project_fee: env::var("PROJECT_FEE")
                .unwrap_or_else(|_| PROJECT_SUBMISSION_FEE.to_string())
                .parse()?,

            ipfs_gateway_url: env_non_empty("IPFS_GATEWAY_URL")
                .unwrap_or_else(|| DEFAULT_IPFS_GATEWAY_URL.to_string()),
            pinata_api_url: env_non_empty("PINATA_API_URL")
                .unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string()),
            pinata_jwt: env_non_empty("PINATA_JWT"),
            upload_body_limit_bytes: env::var("UPLOAD_BODY_LIMIT_BYTES")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_BODY_LIMIT_BYTES.to_string())
                .parse()?,

            discovery_retries: env::var("DISCOVERY_RETRIES")
                .unwrap_or_else(|_| DEFAULT_DISCOVERY_RETRIES.to_string())
                .parse()?,
            discovery_retry_delay_ms: env::var("DISCOVERY_RETRY_DELAY_MS")
                .unwrap_or_else(|_| DEFAULT_DISCOVERY_RETRY_DELAY_MS.to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc_url.trim().is_empty() {
            anyhow::bail!("ONECHAIN_RPC_URL is empty");
        }
        url::Url::parse(&self.rpc_url)
            .map_err(|e| anyhow::anyhow!("ONECHAIN_RPC_URL is invalid: {}", e))?;
        url::Url::parse(&self.ipfs_gateway_url)
            .map_err(|e| anyhow::anyhow!("IPFS_GATEWAY_URL is invalid: {}", e))?;

        if !self.contract().is_configured() {
            tracing::warn!(
                "PACKAGE_ID / REGISTRY_ID not set; running in contract-not-deployed mode"
            );
        }
        if self.pinata_jwt.is_none() {
            tracing::warn!("PINATA_JWT is not set; uploads will fail");
        }
        if self.rpc_accept_invalid_certs {
            tracing::warn!("RPC certificate validation is disabled");
        }
        if self.discovery_retries == 0 {
            tracing::warn!("DISCOVERY_RETRIES is 0; discovery will still make one attempt");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn contract(&self) -> ContractConfig {
        ContractConfig {
            package_id: self.package_id.clone(),
            registry_id: self.registry_id.clone(),
            clock_id: self.clock_id.clone(),
            game_fee: self.game_fee,
            project_fee: self.project_fee,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        rpc_url: "http://localhost:9000".to_string(),
        rpc_accept_invalid_certs: false,
        rpc_timeout_secs: 1,
        registry_transport: RegistryTransportKind::Proxy,
        package_id: Some("0xabc".to_string()),
        registry_id: Some("0xdef".to_string()),
        clock_id: "0x6".to_string(),
        game_fee: GAME_SUBMISSION_FEE,
        project_fee: PROJECT_SUBMISSION_FEE,
        ipfs_gateway_url: "http://localhost:8080".to_string(),
        pinata_api_url: "http://localhost:8081".to_string(),
        pinata_jwt: None,
        upload_body_limit_bytes: 4 * 1024 * 1024,
        discovery_retries: 3,
        discovery_retry_delay_ms: 0,
        cors_allowed_origins: "*".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_ids_are_not_configured() {
        let mut contract = test_config().contract();
        assert!(contract.is_configured());

        contract.registry_id = Some(PLACEHOLDER_REGISTRY_ID.to_string());
        assert!(contract.registry_id().is_none());
        assert!(!contract.is_configured());

        contract.registry_id = Some("0xdef".to_string());
        contract.package_id = Some("   ".to_string());
        assert!(!contract.is_configured());
    }

    #[test]
    fn transport_kind_parses_known_values() {
        assert_eq!(RegistryTransportKind::parse("").unwrap(), RegistryTransportKind::Proxy);
        assert_eq!(
            RegistryTransportKind::parse(" Session ").unwrap(),
            RegistryTransportKind::Session
        );
        assert!(RegistryTransportKind::parse("grpc").is_err());
    }

    #[test]
    fn validate_rejects_bad_rpc_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
