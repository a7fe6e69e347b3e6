use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    config::{Config, ContractConfig, RegistryTransportKind},
    error::{AppError, Result},
    models::RawGameEntry,
    registry::rpc_client::{ObjectDataOptions, ObjectResponse, RpcClient},
};

/// Fetches the registry object's `data` payload from the chain.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn fetch_object(&self, registry_id: &str) -> Result<Value>;

    fn name(&self) -> &'static str;
}

/// A read session held by a connected client, answering structured
/// `get_object` requests in the SDK response shape.
#[async_trait]
pub trait RpcSession: Send + Sync {
    async fn get_object(&self, object_id: &str, options: ObjectDataOptions) -> Result<ObjectResponse>;
}

#[async_trait]
impl RpcSession for RpcClient {
    async fn get_object(&self, object_id: &str, options: ObjectDataOptions) -> Result<ObjectResponse> {
        RpcClient::get_object(self, object_id, options).await
    }
}

fn object_data(response: ObjectResponse) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(AppError::BlockchainRPC(format!("Registry object error: {}", error)));
    }
    response
        .data
        .ok_or_else(|| AppError::BlockchainRPC("No data in registry object response".to_string()))
}

/// Server-side JSON-RPC call straight to the full node.
pub struct ProxyRpcTransport {
    rpc: RpcClient,
}

impl ProxyRpcTransport {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl RegistryTransport for ProxyRpcTransport {
    async fn fetch_object(&self, registry_id: &str) -> Result<Value> {
        let response = self
            .rpc
            .get_object(registry_id, ObjectDataOptions::registry())
            .await?;
        object_data(response)
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}

/// Structured read through an [`RpcSession`].
pub struct SessionTransport {
    session: Arc<dyn RpcSession>,
}

impl SessionTransport {
    pub fn new(session: Arc<dyn RpcSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RegistryTransport for SessionTransport {
    async fn fetch_object(&self, registry_id: &str) -> Result<Value> {
        let response = self
            .session
            .get_object(registry_id, ObjectDataOptions::registry())
            .await?;
        object_data(response)
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

/// Pulls `content.fields.games` out of an object payload. A registry with
/// no `games` field reads as empty.
pub fn games_from_object(data: &Value) -> Vec<RawGameEntry> {
    match data.pointer("/content/fields/games") {
        Some(Value::Array(games)) => games.iter().cloned().map(RawGameEntry).collect(),
        Some(other) => {
            tracing::warn!("Registry games field is not a list: {}", other);
            Vec::new()
        }
        None => {
            let available: Vec<&String> = data
                .pointer("/content/fields")
                .and_then(Value::as_object)
                .map(|fields| fields.keys().collect())
                .unwrap_or_default();
            tracing::warn!("No games field on registry object; available fields: {:?}", available);
            Vec::new()
        }
    }
}

/// Reads the registry object and its raw `games` collection.
#[derive(Clone)]
pub struct RegistryReader {
    contract: ContractConfig,
    transport: Arc<dyn RegistryTransport>,
}

impl RegistryReader {
    pub fn new(contract: ContractConfig, transport: Arc<dyn RegistryTransport>) -> Self {
        Self { contract, transport }
    }

    pub fn from_config(config: &Config, rpc: RpcClient) -> Self {
        let transport: Arc<dyn RegistryTransport> = match config.registry_transport {
            RegistryTransportKind::Proxy => Arc::new(ProxyRpcTransport::new(rpc)),
            RegistryTransportKind::Session => Arc::new(SessionTransport::new(Arc::new(rpc))),
        };
        Self::new(config.contract(), transport)
    }

    pub fn registry_id(&self) -> Option<&str> {
        self.contract.registry_id()
    }

    /// Raw object payload, `None` before the registry is deployed.
    pub async fn read_object(&self) -> Result<Option<Value>> {
        let Some(registry_id) = self.contract.registry_id() else {
            return Ok(None);
        };
        self.transport.fetch_object(registry_id).await.map(Some)
    }

    /// Games in on-chain insertion order. An unconfigured registry reads as
    /// empty; transport and RPC failures are returned as errors.
    pub async fn read_games(&self) -> Result<Vec<RawGameEntry>> {
        let Some(registry_id) = self.contract.registry_id() else {
            tracing::warn!("Registry ID not configured; returning no games");
            return Ok(Vec::new());
        };

        tracing::debug!(
            "Fetching games from registry {} via {} transport",
            registry_id,
            self.transport.name()
        );
        let data = self.transport.fetch_object(registry_id).await?;
        let games = games_from_object(&data);
        tracing::info!("Found {} games on registry", games.len());
        Ok(games)
    }

    /// Same as [`read_games`](Self::read_games) with every failure flattened
    /// to an empty list.
    pub async fn read_games_or_empty(&self) -> Vec<RawGameEntry> {
        match self.read_games().await {
            Ok(games) => games,
            Err(e) => {
                tracing::error!("Error fetching games from registry: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_config;
    use serde_json::json;
    use std::sync::Mutex;

    pub(crate) fn registry_object(games: Value) -> Value {
        json!({
            "objectId": "0xdef",
            "version": "12",
            "type": "0xabc::game_registry::GameRegistry",
            "content": {
                "dataType": "moveObject",
                "fields": { "id": { "id": "0xdef" }, "games": games }
            }
        })
    }

    /// Session double that replays canned responses and records calls.
    pub(crate) struct FakeSession {
        pub responses: Mutex<Vec<Result<ObjectResponse>>>,
        pub calls: Mutex<Vec<(String, ObjectDataOptions)>>,
    }

    impl FakeSession {
        pub(crate) fn new(responses: Vec<Result<ObjectResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RpcSession for FakeSession {
        async fn get_object(&self, object_id: &str, options: ObjectDataOptions) -> Result<ObjectResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((object_id.to_string(), options));
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(ObjectResponse::default());
            }
            responses.remove(0)
        }
    }

    fn reader_with(session: Arc<FakeSession>) -> RegistryReader {
        RegistryReader::new(
            test_config().contract(),
            Arc::new(SessionTransport::new(session)),
        )
    }

    #[tokio::test]
    async fn session_transport_reads_games_in_order() {
        let session = Arc::new(FakeSession::new(vec![Ok(ObjectResponse {
            data: Some(registry_object(json!([{ "name": "A" }, { "name": "B" }]))),
            error: None,
        })]));
        let reader = reader_with(session.clone());

        let games = reader.read_games().await.unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].0["name"], "A");
        assert_eq!(games[1].0["name"], "B");

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "0xdef");
        assert_eq!(calls[0].1, ObjectDataOptions::registry());
    }

    #[tokio::test]
    async fn unconfigured_registry_short_circuits() {
        let session = Arc::new(FakeSession::new(vec![]));
        let mut contract = test_config().contract();
        contract.registry_id = None;
        let reader = RegistryReader::new(contract, Arc::new(SessionTransport::new(session.clone())));

        assert!(reader.read_games().await.unwrap().is_empty());
        assert!(reader.read_object().await.unwrap().is_none());
        assert!(session.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn object_error_is_an_error_internally_and_empty_for_callers() {
        let response = || ObjectResponse {
            data: None,
            error: Some(json!({ "code": "notExists", "object_id": "0xdef" })),
        };
        let session = Arc::new(FakeSession::new(vec![Ok(response()), Ok(response())]));
        let reader = reader_with(session);

        assert!(matches!(
            reader.read_games().await,
            Err(AppError::BlockchainRPC(_))
        ));
        assert!(reader.read_games_or_empty().await.is_empty());
    }

    #[test]
    fn missing_games_field_reads_as_empty() {
        let data = json!({ "content": { "fields": { "id": { "id": "0xdef" } } } });
        assert!(games_from_object(&data).is_empty());
        assert!(games_from_object(&json!({})).is_empty());
    }

    #[tokio::test]
    async fn proxy_transport_issues_get_object_over_json_rpc() {
        use axum::{routing::post, Json, Router};

        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move {
                let result = if request["method"] == "one_getObject"
                    && request["params"][0] == "0xdef"
                    && request["params"][1]["showContent"] == true
                {
                    json!({ "data": registry_object(json!([{ "name": "A" }])) })
                } else {
                    json!({ "error": { "code": "unexpected request" } })
                };
                Json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });

        let rpc = RpcClient::new(format!("http://{}", addr), reqwest::Client::new());
        let data = ProxyRpcTransport::new(rpc).fetch_object("0xdef").await.unwrap();
        assert_eq!(games_from_object(&data).len(), 1);
    }
}
