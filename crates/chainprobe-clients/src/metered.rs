//! Tron full-node HTTP API client.

use chainprobe_core::collaborator::{Identity, MeteredClient};
use chainprobe_core::{CollaboratorError, NetworkId};

use crate::rpc::post_json;

const NETWORK: NetworkId = NetworkId::Metered;

pub struct TronHttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl TronHttpClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl MeteredClient for TronHttpClient {
    async fn latest_block(&self) -> Result<Option<u64>, CollaboratorError> {
        let response = post_json(
            &self.http,
            NETWORK,
            &self.url("wallet/getnowblock"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(block_height(&response))
    }

    fn allocate_identity(&self) -> Identity {
        // Simulated wallet; base58 encoding is not needed for narration.
        let mut address = format!("T{}", hex::encode_upper(rand::random::<[u8; 17]>()));
        address.truncate(34);
        Identity::new(address)
    }
}

fn block_height(response: &serde_json::Value) -> Option<u64> {
    response
        .pointer("/block_header/raw_data/number")
        .and_then(serde_json::Value::as_u64)
}
