//! Ethereum-style JSON-RPC client.

use chainprobe_core::collaborator::{ContractClient, Identity};
use chainprobe_core::{CollaboratorError, NetworkId};
use serde_json::json;

use crate::rpc::post_json;

const NETWORK: NetworkId = NetworkId::Contract;

pub struct EvmRpcClient {
    http: reqwest::Client,
}

impl EvmRpcClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn call(
        &self,
        endpoint: &str,
        method: &str,
    ) -> Result<serde_json::Value, CollaboratorError> {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": [] });
        let response = post_json(&self.http, NETWORK, endpoint, &body).await?;
        rpc_result(response)
    }
}

#[async_trait::async_trait]
impl ContractClient for EvmRpcClient {
    async fn block_number(&self, endpoint: &str) -> Result<u64, CollaboratorError> {
        let result = self.call(endpoint, "eth_blockNumber").await?;
        let quantity = parse_quantity(&result)?
            .ok_or_else(|| CollaboratorError::protocol(NETWORK, "eth_blockNumber returned null"))?;
        u64::try_from(quantity)
            .map_err(|_| CollaboratorError::protocol(NETWORK, "block number out of range"))
    }

    async fn gas_price(&self, endpoint: &str) -> Result<Option<u128>, CollaboratorError> {
        let result = self.call(endpoint, "eth_gasPrice").await?;
        parse_quantity(&result)
    }

    fn allocate_identity(&self) -> Identity {
        Identity::new(format!("0x{}", hex::encode(rand::random::<[u8; 20]>())))
    }
}

/// Extracts `result`, turning a JSON-RPC `error` object into an rpc error.
fn rpc_result(mut response: serde_json::Value) -> Result<serde_json::Value, CollaboratorError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown JSON-RPC error");
        return Err(CollaboratorError::rpc(NETWORK, message, None));
    }
    Ok(response
        .get_mut("result")
        .map(serde_json::Value::take)
        .unwrap_or(serde_json::Value::Null))
}

/// Parses a `0x`-prefixed hex quantity. `null` is `None`.
fn parse_quantity(value: &serde_json::Value) -> Result<Option<u128>, CollaboratorError> {
    let Some(text) = value.as_str() else {
        return if value.is_null() {
            Ok(None)
        } else {
            Err(CollaboratorError::protocol(
                NETWORK,
                format!("expected hex quantity, got {value}"),
            ))
        };
    };
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| CollaboratorError::protocol(NETWORK, format!("missing 0x prefix: {text}")))?;
    u128::from_str_radix(digits, 16)
        .map(Some)
        .map_err(|e| CollaboratorError::protocol(NETWORK, format!("bad hex quantity {text}: {e}")))
}
