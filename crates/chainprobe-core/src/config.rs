//! Probe configuration. Defaults reproduce the demo pacing and price
//! assumptions; every simulated delay can be scaled or disabled.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Artificial delays standing in for transaction building and confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedLatency {
    pub build: Duration,
    pub resource_check: Duration,
    pub broadcast: Duration,
    pub confirmation: Duration,
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self::none()
    }
}

impl SimulatedLatency {
    pub const fn none() -> Self {
        Self {
            build: Duration::ZERO,
            resource_check: Duration::ZERO,
            broadcast: Duration::ZERO,
            confirmation: Duration::ZERO,
        }
    }

    /// Multiplies every delay by `factor` (non-positive factors disable them).
    pub fn scaled(self, factor: f64) -> Self {
        let scale = |d: Duration| {
            if factor.is_finite() && factor > 0.0 {
                d.mul_f64(factor)
            } else {
                Duration::ZERO
            }
        };
        Self {
            build: scale(self.build),
            resource_check: scale(self.resource_check),
            broadcast: scale(self.broadcast),
            confirmation: scale(self.confirmation),
        }
    }
}

/// Approximate USD price of each network's fee asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTable {
    pub ledger_asset_usd: f64,
    pub contract_asset_usd: f64,
    pub metered_asset_usd: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            ledger_asset_usd: 2.5,
            contract_asset_usd: 3000.0,
            metered_asset_usd: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerProbeConfig {
    pub connect_timeout: Duration,
    pub fund_timeout: Duration,
    pub prepare_timeout: Duration,
    pub submit_timeout: Duration,
    /// Payment amount in drops (10 XRP).
    pub amount_drops: u64,
    pub latency: SimulatedLatency,
}

impl Default for LedgerProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            fund_timeout: Duration::from_secs(25),
            prepare_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(20),
            amount_drops: 10_000_000,
            latency: SimulatedLatency::none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractProbeConfig {
    /// Candidate RPC endpoints, tried in order.
    pub endpoints: Vec<String>,
    pub endpoint_timeout: Duration,
    pub query_timeout: Duration,
    pub gas_estimate: u64,
    pub default_gas_price_wei: u128,
    pub token_contract: String,
    pub latency: SimulatedLatency,
}

impl Default for ContractProbeConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://rpc.sepolia.org".to_string(),
                "https://eth-sepolia.public.blastapi.io".to_string(),
                "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            ],
            endpoint_timeout: Duration::from_secs(10),
            query_timeout: Duration::from_secs(10),
            gas_estimate: 65_000,
            default_gas_price_wei: 25_000_000_000,
            token_contract: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
            latency: SimulatedLatency {
                build: Duration::from_secs(1),
                resource_check: Duration::ZERO,
                broadcast: Duration::from_secs(2),
                confirmation: Duration::from_secs(15),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeteredProbeConfig {
    pub query_timeout: Duration,
    /// Fee in the network's native asset for one token transfer.
    pub fee_native: f64,
    pub energy_units: u64,
    pub bandwidth_bytes: u64,
    pub token_contract: String,
    pub latency: SimulatedLatency,
}

impl Default for MeteredProbeConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(10),
            fee_native: 1.2,
            energy_units: 31_895,
            bandwidth_bytes: 345,
            token_contract: "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".to_string(),
            latency: SimulatedLatency {
                build: Duration::from_secs(1),
                resource_check: Duration::from_secs(1),
                broadcast: Duration::from_secs(2),
                confirmation: Duration::from_secs(3),
            },
        }
    }
}

/// Configuration for all three probes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub ledger: LedgerProbeConfig,
    pub contract: ContractProbeConfig,
    pub metered: MeteredProbeConfig,
    pub prices: PriceTable,
}

impl ProbeConfig {
    /// Scales every probe's simulated delays.
    pub fn with_latency_scale(mut self, factor: f64) -> Self {
        self.ledger.latency = self.ledger.latency.scaled(factor);
        self.contract.latency = self.contract.latency.scaled(factor);
        self.metered.latency = self.metered.latency.scaled(factor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_scale_disables_simulated_delays() {
        let config = ProbeConfig::default().with_latency_scale(0.0);
        assert_eq!(config.contract.latency, SimulatedLatency::none());
        assert_eq!(config.metered.latency, SimulatedLatency::none());
    }

    #[test]
    fn half_scale_halves_confirmation_wait() {
        let config = ProbeConfig::default().with_latency_scale(0.5);
        assert_eq!(
            config.contract.latency.confirmation,
            Duration::from_millis(7_500)
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ProbeConfig =
            serde_json::from_value(serde_json::json!({ "prices": { "metered_asset_usd": 0.2 } }))
                .expect("parse");
        assert_eq!(config.prices.metered_asset_usd, 0.2);
        assert_eq!(config.prices.contract_asset_usd, 3000.0);
        assert_eq!(config.contract.gas_estimate, 65_000);
    }
}
