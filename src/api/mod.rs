// src/api/mod.rs

pub mod games;
pub mod health;
pub mod submissions;
pub mod transactions;
pub mod upload;

use std::sync::Arc;

use crate::{
    config::Config,
    integrations::{ContentPinner, IpfsGateway, MetadataSource, PinataClient},
    registry::{RegistryReader, RetryPolicy, RpcClient},
    services::{
        submission::TransactionStatusSource, GameAssembler, SubmittedGameCache, TransactionBuilder,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub rpc: RpcClient,
    pub reader: RegistryReader,
    pub assembler: GameAssembler,
    pub pinner: Arc<dyn ContentPinner>,
    pub status_source: Arc<dyn TransactionStatusSource>,
    pub cache: SubmittedGameCache,
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let rpc = RpcClient::from_config(&config)?;
        let reader = RegistryReader::from_config(&config, rpc.clone());
        let metadata: Arc<dyn MetadataSource> = Arc::new(IpfsGateway::from_config(&config)?);

        Ok(Self {
            reader,
            assembler: GameAssembler::new(metadata),
            pinner: Arc::new(PinataClient::from_config(&config)),
            status_source: Arc::new(rpc.clone()),
            cache: SubmittedGameCache::new(),
            retry: RetryPolicy::from_config(&config),
            rpc,
            config,
        })
    }

    pub fn transaction_builder(&self) -> TransactionBuilder {
        TransactionBuilder::new(self.config.contract())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::registry::reader::RegistryTransport;
    use crate::services::submission::tests::FixedStatus;

    /// State wired to in-memory collaborators. The RPC client points at a
    /// closed port and must not be reached; every digest verifies.
    pub(crate) fn test_state(
        transport: Arc<dyn RegistryTransport>,
        metadata: Arc<dyn MetadataSource>,
        pinner: Arc<dyn ContentPinner>,
    ) -> AppState {
        let config = test_config();
        AppState {
            rpc: RpcClient::new("http://127.0.0.1:9".to_string(), reqwest::Client::new()),
            reader: RegistryReader::new(config.contract(), transport),
            assembler: GameAssembler::new(metadata),
            pinner,
            status_source: Arc::new(FixedStatus::success()),
            cache: SubmittedGameCache::new(),
            retry: RetryPolicy::from_config(&config),
            config,
        }
    }
}
