use std::sync::Arc;

use tracing::{debug, warn};

use crate::collaborator::{LedgerClient, LedgerConnection, Settled};
use crate::config::LedgerProbeConfig;
use crate::emitter::ProgressEmitter;
use crate::errors::ProbeError;
use crate::event::Observation;
use crate::network::NetworkId;
use crate::outcome::round_to;
use crate::probe::{Probe, Settlement, pause, step};

const DROPS_PER_UNIT: f64 = 1_000_000.0;

/// Payment on the ledger network: connect, fund, autofill, submit, wait.
pub struct LedgerProbe {
    client: Arc<dyn LedgerClient>,
    config: LedgerProbeConfig,
    asset_usd: f64,
}

impl LedgerProbe {
    pub fn new(client: Arc<dyn LedgerClient>, config: LedgerProbeConfig, asset_usd: f64) -> Self {
        Self {
            client,
            config,
            asset_usd,
        }
    }

    async fn transfer(
        &self,
        connection: &dyn LedgerConnection,
        emitter: &ProgressEmitter,
    ) -> Result<Settlement, ProbeError> {
        emitter.log("Connected! Funding Bank A wallet...");
        let sender = step(
            "Funding",
            self.config.fund_timeout,
            connection.fund_identity(),
        )
        .await?;
        emitter.observe(
            format!("Bank A wallet: {}", sender.address),
            Observation::Address {
                address: sender.address.clone(),
            },
        );

        let receiver = connection.allocate_identity();
        emitter.log(format!("Bank B receiving address: {}", receiver.address));
        emitter.log("Preparing payment: $10,000 USD equivalent");

        let payment = step(
            "Autofill",
            self.config.prepare_timeout,
            connection.prepare_payment(&sender, &receiver, self.config.amount_drops),
        )
        .await?;
        let fee = ledger_fee_usd(payment.fee_drops, self.asset_usd);
        emitter.observe(
            format!("Network fee: {} drops (~${fee:.4})", payment.fee_drops),
            Observation::Fee { fee },
        );

        if connection.signs_payments() {
            emitter.log("Signing transaction with Bank A credentials...");
        } else {
            emitter.log("No signing keys available, simulating submission...");
        }
        pause(self.config.latency.build).await;
        emitter.log("Broadcasting to XRPL network...");
        pause(self.config.latency.broadcast).await;
        let receipt = step(
            "Submission",
            self.config.submit_timeout,
            connection.submit_and_wait(&payment),
        )
        .await?;
        pause(self.config.latency.confirmation).await;

        let reference = match receipt.settled {
            Settled::Transaction => {
                emitter.log("Payment confirmed in ledger!");
                emitter.log(format!("Transaction hash: {}", receipt.reference));
                receipt.reference
            }
            Settled::ValidatedLedger => {
                emitter.log("Simulated payment settled with the next validated ledger");
                emitter.log(format!("Validated ledger hash: {}", receipt.reference));
                format!("ledger-{}", receipt.reference)
            }
        };
        Ok(Settlement {
            fee,
            reference: Some(reference),
        })
    }
}

#[async_trait::async_trait]
impl Probe for LedgerProbe {
    fn network(&self) -> NetworkId {
        NetworkId::Ledger
    }

    async fn execute(&self, emitter: &ProgressEmitter) -> Result<Settlement, ProbeError> {
        emitter.log("Bank A initiating XRPL transfer...");
        emitter.log("Connecting to XRPL network...");
        let connection = step(
            "Connection",
            self.config.connect_timeout,
            self.client.connect(),
        )
        .await?;

        let result = self.transfer(connection.as_ref(), emitter).await;

        // Consumes the connection: released once on every path.
        match connection.disconnect().await {
            Ok(()) => debug!("ledger connection released"),
            Err(err) => warn!(error = %err, "ledger disconnect failed"),
        }
        result
    }
}

/// Fee in USD for a fee quoted in drops, rounded to 4 decimals.
pub fn ledger_fee_usd(fee_drops: u64, asset_usd: f64) -> f64 {
    round_to(fee_drops as f64 / DROPS_PER_UNIT * asset_usd, 4)
}
