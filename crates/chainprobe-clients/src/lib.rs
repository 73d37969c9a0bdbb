//! reqwest-backed collaborators for the chainprobe probes.

mod contract;
mod ledger;
mod metered;
mod rpc;

use std::sync::Arc;
use std::time::Duration;

use chainprobe_core::estimate::Estimator;
use chainprobe_core::{NetworkId, ProbeConfig, ProbeSet};

pub use contract::EvmRpcClient;
pub use ledger::{DEFAULT_DESTINATION, XrplRpcClient};
pub use metered::TronHttpClient;
pub use rpc::HttpPing;

/// Where each network's client connects.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub ledger_rpc: String,
    pub ledger_faucet: String,
    /// Quick-estimate target for the ledger network.
    pub ledger_ping: String,
    pub metered_api: String,
    /// Per-request HTTP timeout. Probe step timeouts still apply on top.
    pub http_timeout: Duration,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ledger_rpc: "https://s.altnet.rippletest.net:51234".to_string(),
            ledger_faucet: "https://faucet.altnet.rippletest.net/accounts".to_string(),
            ledger_ping: "https://xrplcluster.com/".to_string(),
            metered_api: "https://api.shasta.trongrid.io".to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }
}

/// The three live clients sharing one HTTP connection pool.
#[derive(Clone)]
pub struct NetworkClients {
    http: reqwest::Client,
    endpoints: Endpoints,
    ledger: Arc<XrplRpcClient>,
    contract: Arc<EvmRpcClient>,
    metered: Arc<TronHttpClient>,
}

impl NetworkClients {
    pub fn new(endpoints: Endpoints) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(endpoints.http_timeout)
            .user_agent(concat!("chainprobe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            ledger: Arc::new(XrplRpcClient::new(
                http.clone(),
                endpoints.ledger_rpc.clone(),
                endpoints.ledger_faucet.clone(),
            )),
            contract: Arc::new(EvmRpcClient::new(http.clone())),
            metered: Arc::new(TronHttpClient::new(http.clone(), endpoints.metered_api.clone())),
            http,
            endpoints,
        })
    }

    /// Standard probes wired to these clients.
    pub fn probe_set(&self, config: &ProbeConfig) -> ProbeSet {
        ProbeSet::from_clients(
            self.ledger.clone(),
            self.contract.clone(),
            self.metered.clone(),
            config,
        )
    }

    /// Quick-estimate pings. The contract network is pinged at its first
    /// configured endpoint.
    pub fn estimator(&self, config: &ProbeConfig) -> Estimator {
        let contract_url = config
            .contract
            .endpoints
            .first()
            .cloned()
            .unwrap_or_default();
        Estimator::new(
            Arc::new(HttpPing::head(
                self.http.clone(),
                NetworkId::Metered,
                self.endpoints.metered_api.clone(),
            )),
            Arc::new(HttpPing::post(self.http.clone(), NetworkId::Contract, contract_url)),
            Arc::new(HttpPing::head(
                self.http.clone(),
                NetworkId::Ledger,
                self.endpoints.ledger_ping.clone(),
            )),
            self.endpoints.http_timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_public_testnets() {
        let endpoints = Endpoints::default();
        assert!(endpoints.ledger_rpc.contains("altnet"));
        assert!(endpoints.metered_api.contains("shasta"));
    }

    #[test]
    fn clients_build_from_defaults() {
        let clients = NetworkClients::new(Endpoints::default()).expect("client");
        let probes = clients.probe_set(&ProbeConfig::default());
        let networks: Vec<_> = probes.iter().map(|p| p.network()).collect();
        assert_eq!(networks, NetworkId::AGGREGATE_ORDER.to_vec());
    }
}
