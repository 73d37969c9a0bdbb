//! Quick estimates from a single reachability call per network.
//!
//! Estimates never fail: an unreachable network reports its fallback pair.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::collaborator::Reachability;
use crate::network::NetworkId;
use crate::outcome::{Fallback, Outcome, round_to};
use crate::probe::step;

/// Scaling applied to a measured round trip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimateRule {
    pub multiplier: f64,
    pub floor_seconds: f64,
}

impl EstimateRule {
    pub const fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Ledger => Self {
                multiplier: 1.0,
                floor_seconds: 3.0,
            },
            NetworkId::Contract => Self {
                multiplier: 10.0,
                floor_seconds: 15.0,
            },
            NetworkId::Metered => Self {
                multiplier: 8.0,
                floor_seconds: 12.0,
            },
        }
    }

    pub fn apply(self, measured: Duration) -> f64 {
        round_to(
            (measured.as_secs_f64() * self.multiplier).max(self.floor_seconds),
            2,
        )
    }
}

#[derive(Clone)]
pub struct Estimator {
    targets: [Arc<dyn Reachability>; 3],
    ping_timeout: Duration,
}

impl Estimator {
    pub fn new(
        metered: Arc<dyn Reachability>,
        contract: Arc<dyn Reachability>,
        ledger: Arc<dyn Reachability>,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            targets: [metered, contract, ledger],
            ping_timeout,
        }
    }

    pub async fn estimate(&self, network: NetworkId) -> Outcome {
        let target = &self.targets[network.aggregate_index()];
        let started = Instant::now();
        match step("Ping", self.ping_timeout, target.ping()).await {
            Ok(()) => {
                let measured = started.elapsed();
                let seconds = EstimateRule::for_network(network).apply(measured);
                debug!(network = %network, ?measured, seconds, "estimate from round trip");
                Outcome {
                    elapsed_seconds: seconds,
                    ..Outcome::succeeded(
                        network,
                        Fallback::for_network(network).fee,
                        Duration::ZERO,
                        None,
                    )
                }
            }
            Err(err) => {
                warn!(network = %network, error = %err, "reachability failed, using fallback");
                let fallback = Fallback::for_network(network);
                Outcome {
                    elapsed_seconds: fallback.elapsed_seconds,
                    ..Outcome::succeeded(network, fallback.fee, Duration::ZERO, None)
                }
            }
        }
    }

    /// All three estimates, concurrently, in aggregate order.
    pub async fn estimate_all(&self) -> Vec<Outcome> {
        let [metered, contract, ledger] = NetworkId::AGGREGATE_ORDER;
        let (metered, contract, ledger) = tokio::join!(
            self.estimate(metered),
            self.estimate(contract),
            self.estimate(ledger)
        );
        vec![metered, contract, ledger]
    }
}
