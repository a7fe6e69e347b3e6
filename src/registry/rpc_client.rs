use crate::{
    config::Config,
    constants::{RPC_CONNECT_TIMEOUT_SECS, RPC_METHOD_GET_OBJECT, RPC_METHOD_GET_TRANSACTION_BLOCK},
    error::{AppError, Result},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

fn rpc_request(method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params
    })
}

/// Which parts of an object the node should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDataOptions {
    pub show_type: bool,
    pub show_owner: bool,
    pub show_previous_transaction: bool,
    pub show_display: bool,
    pub show_content: bool,
    pub show_bcs: bool,
    pub show_storage_rebate: bool,
}

impl ObjectDataOptions {
    /// Options used for every registry read: parsed content plus ownership
    /// metadata, never the BCS bytes or the display rendering.
    pub fn registry() -> Self {
        Self {
            show_type: true,
            show_owner: true,
            show_previous_transaction: true,
            show_display: false,
            show_content: true,
            show_bcs: false,
            show_storage_rebate: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBlockOptions {
    pub show_input: bool,
    pub show_raw_input: bool,
    pub show_effects: bool,
    pub show_events: bool,
    pub show_object_changes: bool,
    pub show_balance_changes: bool,
}

impl Default for TransactionBlockOptions {
    fn default() -> Self {
        Self {
            show_input: true,
            show_raw_input: false,
            show_effects: true,
            show_events: true,
            show_object_changes: true,
            show_balance_changes: true,
        }
    }
}

/// Object read result in the SDK shape: `data` on success, `error` when the
/// node could not resolve the object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// JSON-RPC client for the chain full node
#[derive(Debug, Clone)]
pub struct RpcClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(rpc_url: String, client: reqwest::Client) -> Self {
        Self { rpc_url, client }
    }

    /// Builds the client the server uses. Some public full nodes present
    /// certificates browsers reject, so validation can be switched off.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(RPC_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.rpc_timeout_secs.max(1)))
            .danger_accept_invalid_certs(config.rpc_accept_invalid_certs)
            .build()
            .map_err(|e| AppError::Internal(format!("RPC HTTP client init failed: {}", e)))?;
        Ok(Self::new(config.rpc_url.clone(), client))
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Issues one JSON-RPC call and returns its `result`. An `error` member
    /// in the envelope is reported as `BlockchainRPC`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = rpc_request(method, params);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::BlockchainRPC(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BlockchainRPC(format!(
                "{} returned HTTP {}: {}",
                method, status, body
            )));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| AppError::BlockchainRPC(format!("{} parse failed: {}", method, e)))?;

        unwrap_envelope(method, envelope)
    }

    pub async fn get_object(&self, object_id: &str, options: ObjectDataOptions) -> Result<ObjectResponse> {
        let result = self
            .call(RPC_METHOD_GET_OBJECT, serde_json::json!([object_id, options]))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| AppError::BlockchainRPC(format!("Unexpected object response: {}", e)))
    }

    pub async fn get_transaction_block(
        &self,
        digest: &str,
        options: TransactionBlockOptions,
    ) -> Result<Value> {
        self.call(
            RPC_METHOD_GET_TRANSACTION_BLOCK,
            serde_json::json!([digest, options]),
        )
        .await
    }
}

fn unwrap_envelope(method: &str, envelope: RpcResponse) -> Result<Value> {
    if let Some(error) = envelope.error {
        tracing::warn!("{} returned RPC error: {}", method, error);
        return Err(AppError::BlockchainRPC(format!("{} RPC error: {}", method, error)));
    }
    envelope
        .result
        .ok_or_else(|| AppError::BlockchainRPC(format!("{} returned no result", method)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rpc_request_sets_method_and_id() {
        let req = rpc_request(RPC_METHOD_GET_OBJECT, json!(["0x1"]));
        assert_eq!(req.get("method").and_then(|v| v.as_str()), Some("one_getObject"));
        assert_eq!(req.get("id").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(req.get("jsonrpc").and_then(|v| v.as_str()), Some("2.0"));
    }

    #[test]
    fn registry_options_serialize_in_camel_case() {
        let value = serde_json::to_value(ObjectDataOptions::registry()).unwrap();
        assert_eq!(
            value,
            json!({
                "showType": true,
                "showOwner": true,
                "showPreviousTransaction": true,
                "showDisplay": false,
                "showContent": true,
                "showBcs": false,
                "showStorageRebate": true
            })
        );
    }

    #[test]
    fn envelope_error_becomes_blockchain_rpc() {
        let envelope: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        }))
        .unwrap();
        let err = unwrap_envelope(RPC_METHOD_GET_OBJECT, envelope).unwrap_err();
        assert!(matches!(err, AppError::BlockchainRPC(msg) if msg.contains("Invalid params")));
    }

    #[test]
    fn envelope_result_is_returned() {
        let envelope: RpcResponse =
            serde_json::from_value(json!({ "result": { "data": { "objectId": "0x1" } } })).unwrap();
        let result = unwrap_envelope(RPC_METHOD_GET_OBJECT, envelope).unwrap();
        assert_eq!(result["data"]["objectId"], "0x1");
    }
}
