use std::sync::Arc;

use crate::collaborator::MeteredClient;
use crate::config::MeteredProbeConfig;
use crate::emitter::ProgressEmitter;
use crate::errors::ProbeError;
use crate::event::Observation;
use crate::network::NetworkId;
use crate::outcome::round_to;
use crate::probe::{Probe, Settlement, pause, step};

/// Token transfer estimate on the resource-metered network.
pub struct MeteredProbe {
    client: Arc<dyn MeteredClient>,
    config: MeteredProbeConfig,
    asset_usd: f64,
}

impl MeteredProbe {
    pub fn new(client: Arc<dyn MeteredClient>, config: MeteredProbeConfig, asset_usd: f64) -> Self {
        Self {
            client,
            config,
            asset_usd,
        }
    }
}

#[async_trait::async_trait]
impl Probe for MeteredProbe {
    fn network(&self) -> NetworkId {
        NetworkId::Metered
    }

    async fn execute(&self, emitter: &ProgressEmitter) -> Result<Settlement, ProbeError> {
        emitter.log("Bank A initiating Tron USDT transfer...");
        emitter.log("Connecting to Tron network...");
        let block = step(
            "Block query",
            self.config.query_timeout,
            self.client.latest_block(),
        )
        .await?;
        match block {
            Some(height) => emitter.observe(
                format!("Connected to Tron. Block: {height}"),
                Observation::BlockHeight {
                    block_number: height,
                },
            ),
            None => emitter.log("Connected to Tron. Block: unknown"),
        }

        let sender = self.client.allocate_identity();
        emitter.observe(
            format!("Bank A wallet: {}", sender.address),
            Observation::Address {
                address: sender.address.clone(),
            },
        );
        let receiver = self.client.allocate_identity();
        emitter.log(format!("Bank B receiving wallet: {}", receiver.address));
        emitter.log("Preparing USDT-TRC20 transfer: $10,000");
        emitter.log(format!("Using USDT contract: {}", self.config.token_contract));
        pause(self.config.latency.build).await;

        emitter.log("Checking bandwidth and energy costs...");
        pause(self.config.latency.resource_check).await;
        let fee = round_to(self.config.fee_native * self.asset_usd, 2);
        emitter.log(format!(
            "Energy: {} units, Bandwidth: {} bytes",
            self.config.energy_units, self.config.bandwidth_bytes
        ));
        emitter.observe(
            format!("Total fee: {} TRX (~${fee:.2})", self.config.fee_native),
            Observation::Fee { fee },
        );

        emitter.log("Broadcasting TRC-20 transaction...");
        pause(self.config.latency.broadcast).await;
        emitter.log(format!(
            "Waiting for block confirmation ({}s avg)...",
            self.config.latency.confirmation.as_secs_f64()
        ));
        pause(self.config.latency.confirmation).await;
        emitter.log("Transaction confirmed!");

        let reference = match block {
            Some(height) => format!("TRC20-{height}"),
            None => "TRC20-simulated".to_string(),
        };
        Ok(Settlement {
            fee,
            reference: Some(reference),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::run_probe;
    use crate::testkit::FakeMetered;

    fn probe(fake: FakeMetered) -> MeteredProbe {
        MeteredProbe::new(Arc::new(fake), MeteredProbeConfig::default(), 0.1)
    }

    #[tokio::test(start_paused = true)]
    async fn reference_embeds_block_height() {
        let emitter = ProgressEmitter::detached(NetworkId::Metered);
        let outcome = run_probe(&probe(FakeMetered::at_block(Some(61_000_000))), &emitter).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.fee, 0.12);
        assert_eq!(outcome.reference.as_deref(), Some("TRC20-61000000"));
        // 1s build + 1s resources + 2s broadcast + 3s confirmation.
        assert_eq!(outcome.elapsed_seconds, 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_block_uses_simulated_reference() {
        let emitter = ProgressEmitter::detached(NetworkId::Metered);
        let outcome = run_probe(&probe(FakeMetered::at_block(None)), &emitter).await;
        assert_eq!(outcome.reference.as_deref(), Some("TRC20-simulated"));
    }

    #[tokio::test(start_paused = true)]
    async fn api_error_falls_back() {
        let emitter = ProgressEmitter::detached(NetworkId::Metered);
        let outcome = run_probe(&probe(FakeMetered::failing(503)), &emitter).await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fee, 1.2);
        assert_eq!(outcome.failure_reason.as_deref(), Some("Tron API error: 503"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_api_times_out_after_query_timeout() {
        let emitter = ProgressEmitter::detached(NetworkId::Metered);
        let outcome = run_probe(&probe(FakeMetered::hanging()), &emitter).await;
        assert_eq!(
            outcome.failure_reason.as_deref(),
            Some("Block query timeout after 10s")
        );
        assert_eq!(outcome.elapsed_seconds, 10.0);
    }
}
