//! Probe contract and the runner that turns any probe run into exactly one
//! [`Outcome`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument as _, debug, info_span, warn};

use crate::emitter::ProgressEmitter;
use crate::errors::{CollaboratorError, ProbeError};
use crate::event::Observation;
use crate::network::NetworkId;
use crate::outcome::{Outcome, round_to};

/// What a successful probe run settled on.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// Fee in USD, already rounded for reporting.
    pub fee: f64,
    pub reference: Option<String>,
}

/// A fixed sequence of timed steps against one network.
///
/// Implementations return `Err` from any failing step; [`run_probe`] owns
/// the conversion into a failure event and a failed outcome.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    fn network(&self) -> NetworkId;

    async fn execute(&self, emitter: &ProgressEmitter) -> Result<Settlement, ProbeError>;
}

/// Runs a probe to its terminal state. Never fails.
pub async fn run_probe(probe: &dyn Probe, emitter: &ProgressEmitter) -> Outcome {
    let network = probe.network();
    let started = Instant::now();
    let result = probe
        .execute(emitter)
        .instrument(info_span!("probe", network = %network))
        .await;
    let elapsed = started.elapsed();

    match result {
        Ok(settlement) => {
            let seconds = round_to(elapsed.as_secs_f64(), 2);
            debug!(network = %network, seconds, fee = settlement.fee, "probe settled");
            emitter.observe(
                format!("Funds received! Total time: {seconds:.2}s"),
                Observation::Elapsed {
                    elapsed_seconds: seconds,
                },
            );
            Outcome::succeeded(network, settlement.fee, elapsed, settlement.reference)
        }
        Err(err) => {
            let reason = err.reason();
            warn!(network = %network, error = %err, "probe failed");
            emitter.fail(reason.clone());
            Outcome::failed(network, elapsed, reason)
        }
    }
}

/// Awaits one collaborator call, bounded by `limit`.
pub async fn step<T, F>(name: &'static str, limit: Duration, call: F) -> Result<T, ProbeError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(ProbeError::from),
        Err(_) => Err(ProbeError::Timeout { step: name, after: limit }),
    }
}

/// Simulated latency. Zero durations do not yield.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
