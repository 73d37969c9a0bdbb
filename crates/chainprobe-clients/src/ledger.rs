//! XRPL JSON-RPC and testnet faucet client.
//!
//! The client does not hold signing keys, so submission is simulated:
//! `submit_and_wait` waits for the next validated ledger and returns that
//! ledger's hash as a [`Settled::ValidatedLedger`] receipt.

use std::time::Duration;

use chainprobe_core::collaborator::{
    Identity, LedgerClient, LedgerConnection, PreparedPayment, Receipt, Settled,
};
use chainprobe_core::{CollaboratorError, NetworkId};
use serde_json::json;
use tracing::{debug, info};

use crate::rpc::{post_json, url_host};

const NETWORK: NetworkId = NetworkId::Ledger;

/// Receiving account used when none is configured.
pub const DEFAULT_DESTINATION: &str = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY";

#[derive(Clone)]
pub struct XrplRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    faucet_url: String,
    destination: String,
    poll_interval: Duration,
}

impl XrplRpcClient {
    pub fn new(
        http: reqwest::Client,
        rpc_url: impl Into<String>,
        faucet_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
            faucet_url: faucet_url.into(),
            destination: DEFAULT_DESTINATION.to_string(),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }
}

#[async_trait::async_trait]
impl LedgerClient for XrplRpcClient {
    async fn connect(&self) -> Result<Box<dyn LedgerConnection>, CollaboratorError> {
        let info = call(&self.http, &self.rpc_url, "server_info", json!({})).await?;
        let state = info
            .pointer("/info/server_state")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");
        info!(
            event = "ledger.connected",
            url_host = url_host(&self.rpc_url),
            server_state = state,
            "ledger session opened"
        );
        Ok(Box::new(XrplConnection {
            client: self.clone(),
        }))
    }
}

struct XrplConnection {
    client: XrplRpcClient,
}

impl XrplConnection {
    async fn validated_ledger(&self) -> Result<(u64, String), CollaboratorError> {
        let result = call(
            &self.client.http,
            &self.client.rpc_url,
            "ledger",
            json!({ "ledger_index": "validated" }),
        )
        .await?;
        parse_validated_ledger(&result)
    }
}

#[async_trait::async_trait]
impl LedgerConnection for XrplConnection {
    async fn fund_identity(&self) -> Result<Identity, CollaboratorError> {
        let response = post_json(&self.client.http, NETWORK, &self.client.faucet_url, &json!({}))
            .await?;
        faucet_account(&response).map(Identity::new)
    }

    fn allocate_identity(&self) -> Identity {
        Identity::new(self.client.destination.clone())
    }

    fn signs_payments(&self) -> bool {
        false
    }

    async fn prepare_payment(
        &self,
        from: &Identity,
        to: &Identity,
        amount_drops: u64,
    ) -> Result<PreparedPayment, CollaboratorError> {
        let result = call(&self.client.http, &self.client.rpc_url, "fee", json!({})).await?;
        Ok(PreparedPayment {
            from: from.clone(),
            to: to.clone(),
            amount_drops,
            fee_drops: open_ledger_fee(&result)?,
        })
    }

    async fn submit_and_wait(
        &self,
        payment: &PreparedPayment,
    ) -> Result<Receipt, CollaboratorError> {
        let (start, _) = self.validated_ledger().await?;
        debug!(
            event = "ledger.awaiting_validation",
            from = %payment.from.address,
            start_ledger = start,
            "waiting for next validated ledger"
        );
        loop {
            tokio::time::sleep(self.client.poll_interval).await;
            let (index, hash) = self.validated_ledger().await?;
            if index > start {
                return Ok(Receipt {
                    reference: hash,
                    settled: Settled::ValidatedLedger,
                });
            }
        }
    }

    async fn disconnect(self: Box<Self>) -> Result<(), CollaboratorError> {
        debug!(event = "ledger.disconnected", "ledger session closed");
        Ok(())
    }
}

/// One JSON-RPC call; returns `result` or the server's error as an rpc error.
async fn call(
    http: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value, CollaboratorError> {
    let body = json!({ "method": method, "params": [params] });
    let response = post_json(http, NETWORK, url, &body).await?;
    rpc_result(response)
}

fn rpc_result(mut response: serde_json::Value) -> Result<serde_json::Value, CollaboratorError> {
    let result = response
        .get_mut("result")
        .map(serde_json::Value::take)
        .ok_or_else(|| CollaboratorError::protocol(NETWORK, "response has no result"))?;
    if result.get("status").and_then(|s| s.as_str()) == Some("error") {
        let message = result
            .get("error_message")
            .or_else(|| result.get("error"))
            .and_then(|m| m.as_str())
            .unwrap_or("unknown rippled error");
        return Err(CollaboratorError::rpc(NETWORK, message, None));
    }
    Ok(result)
}

fn faucet_account(response: &serde_json::Value) -> Result<String, CollaboratorError> {
    let account = response.get("account");
    account
        .and_then(|a| a.get("classicAddress").or_else(|| a.get("address")))
        .and_then(|a| a.as_str())
        .map(str::to_string)
        .ok_or_else(|| CollaboratorError::protocol(NETWORK, "faucet response has no account"))
}

fn open_ledger_fee(result: &serde_json::Value) -> Result<u64, CollaboratorError> {
    let drops = result.get("drops");
    drops
        .and_then(|d| d.get("open_ledger_fee").or_else(|| d.get("base_fee")))
        .and_then(|f| f.as_str())
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| CollaboratorError::protocol(NETWORK, "fee response has no drops"))
}

fn parse_validated_ledger(result: &serde_json::Value) -> Result<(u64, String), CollaboratorError> {
    let index = match result.get("ledger_index") {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    let hash = result
        .get("ledger_hash")
        .and_then(|h| h.as_str())
        .map(str::to_string);
    match (index, hash) {
        (Some(index), Some(hash)) => Ok((index, hash)),
        _ => Err(CollaboratorError::protocol(
            NETWORK,
            "ledger response missing index or hash",
        )),
    }
}
