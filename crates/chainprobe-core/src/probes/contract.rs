use std::sync::Arc;

use tracing::debug;

use crate::collaborator::ContractClient;
use crate::config::ContractProbeConfig;
use crate::emitter::ProgressEmitter;
use crate::errors::ProbeError;
use crate::event::Observation;
use crate::network::NetworkId;
use crate::outcome::round_to;
use crate::probe::{Probe, Settlement, pause, step};

const WEI_PER_UNIT: f64 = 1e18;
const WEI_PER_GWEI: f64 = 1e9;

/// Token transfer estimate on the smart-contract network.
///
/// Only endpoint selection, block height and gas price touch the network;
/// broadcast and confirmation are simulated delays.
pub struct ContractProbe {
    client: Arc<dyn ContractClient>,
    config: ContractProbeConfig,
    asset_usd: f64,
}

impl ContractProbe {
    pub fn new(client: Arc<dyn ContractClient>, config: ContractProbeConfig, asset_usd: f64) -> Self {
        Self {
            client,
            config,
            asset_usd,
        }
    }

    /// First endpoint that answers a block-height query.
    async fn select_endpoint(&self) -> Result<&str, ProbeError> {
        let mut last_error = None;
        for endpoint in &self.config.endpoints {
            match step(
                "Endpoint",
                self.config.endpoint_timeout,
                self.client.block_number(endpoint),
            )
            .await
            {
                Ok(_) => return Ok(endpoint),
                Err(err) => {
                    debug!(endpoint = %endpoint, error = %err, "endpoint rejected");
                    last_error = Some(err.reason());
                }
            }
        }
        Err(ProbeError::EndpointsExhausted {
            network: NetworkId::Contract,
            last: last_error.unwrap_or_else(|| "no endpoints configured".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl Probe for ContractProbe {
    fn network(&self) -> NetworkId {
        NetworkId::Contract
    }

    async fn execute(&self, emitter: &ProgressEmitter) -> Result<Settlement, ProbeError> {
        emitter.log("Bank A initiating Ethereum USDT transfer...");
        emitter.log("Connecting to Ethereum network...");
        let endpoint = self.select_endpoint().await?;
        debug!(endpoint, "endpoint selected");

        let block = step(
            "Block query",
            self.config.query_timeout,
            self.client.block_number(endpoint),
        )
        .await?;
        emitter.observe(
            format!("Connected to Ethereum. Block: {block}"),
            Observation::BlockHeight {
                block_number: block,
            },
        );

        let sender = self.client.allocate_identity();
        emitter.observe(
            format!("Bank A wallet: {}", sender.address),
            Observation::Address {
                address: sender.address.clone(),
            },
        );
        let receiver = self.client.allocate_identity();
        emitter.log(format!("Bank B receiving wallet: {}", receiver.address));
        emitter.log("Preparing USDT transfer: $10,000");
        emitter.log(format!(
            "Using USDT contract: {}...",
            contract_prefix(&self.config.token_contract)
        ));
        pause(self.config.latency.build).await;

        emitter.log("Estimating gas for ERC-20 transfer...");
        let gas_price = step(
            "Gas price",
            self.config.query_timeout,
            self.client.gas_price(endpoint),
        )
        .await?
        .unwrap_or(self.config.default_gas_price_wei);
        let fee = contract_fee_usd(self.config.gas_estimate, gas_price, self.asset_usd);
        emitter.observe(
            format!(
                "Gas required: {} units @ {} gwei",
                self.config.gas_estimate,
                gas_price as f64 / WEI_PER_GWEI
            ),
            Observation::Fee { fee },
        );

        emitter.log("Broadcasting transaction...");
        pause(self.config.latency.broadcast).await;
        emitter.log(format!(
            "Waiting for block confirmation ({}s avg)...",
            self.config.latency.confirmation.as_secs_f64()
        ));
        pause(self.config.latency.confirmation).await;
        emitter.log("Transaction confirmed!");

        Ok(Settlement {
            fee,
            reference: Some(format!("0x{block:064x}")),
        })
    }
}

/// Fee in USD for `gas` units at `gas_price_wei`, rounded to 2 decimals.
pub fn contract_fee_usd(gas: u64, gas_price_wei: u128, asset_usd: f64) -> f64 {
    let cost_wei = u128::from(gas).saturating_mul(gas_price_wei);
    round_to(cost_wei as f64 / WEI_PER_UNIT * asset_usd, 2)
}

fn contract_prefix(address: &str) -> &str {
    address.get(..10).unwrap_or(address)
}
