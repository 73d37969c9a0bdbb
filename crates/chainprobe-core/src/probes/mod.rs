//! The three network probes and the set a session runs.

mod contract;
mod ledger;
mod metered;

use std::sync::Arc;

pub use contract::{ContractProbe, contract_fee_usd};
pub use ledger::{LedgerProbe, ledger_fee_usd};
pub use metered::MeteredProbe;

use crate::collaborator::{ContractClient, LedgerClient, MeteredClient};
use crate::config::ProbeConfig;
use crate::network::NetworkId;
use crate::probe::Probe;

/// One probe per network, addressed in aggregate order.
#[derive(Clone)]
pub struct ProbeSet {
    probes: [Arc<dyn Probe>; 3],
}

impl ProbeSet {
    /// Builds the set from one probe per network, passed in aggregate order.
    pub fn new(
        metered: Arc<dyn Probe>,
        contract: Arc<dyn Probe>,
        ledger: Arc<dyn Probe>,
    ) -> Self {
        debug_assert_eq!(metered.network(), NetworkId::Metered);
        debug_assert_eq!(contract.network(), NetworkId::Contract);
        debug_assert_eq!(ledger.network(), NetworkId::Ledger);
        Self {
            probes: [metered, contract, ledger],
        }
    }

    /// Wires the standard probes to their collaborators.
    pub fn from_clients(
        ledger: Arc<dyn LedgerClient>,
        contract: Arc<dyn ContractClient>,
        metered: Arc<dyn MeteredClient>,
        config: &ProbeConfig,
    ) -> Self {
        Self::new(
            Arc::new(MeteredProbe::new(
                metered,
                config.metered.clone(),
                config.prices.metered_asset_usd,
            )),
            Arc::new(ContractProbe::new(
                contract,
                config.contract.clone(),
                config.prices.contract_asset_usd,
            )),
            Arc::new(LedgerProbe::new(
                ledger,
                config.ledger.clone(),
                config.prices.ledger_asset_usd,
            )),
        )
    }

    pub fn get(&self, network: NetworkId) -> Arc<dyn Probe> {
        self.probes[network.aggregate_index()].clone()
    }

    /// Probes in [`NetworkId::AGGREGATE_ORDER`].
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Probe>> {
        self.probes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::PacedProbe;
    use std::time::Duration;

    #[test]
    fn set_is_addressed_by_network() {
        let paced = |network| -> Arc<dyn Probe> {
            Arc::new(PacedProbe::new(network, Duration::ZERO))
        };
        let set = ProbeSet::new(
            paced(NetworkId::Metered),
            paced(NetworkId::Contract),
            paced(NetworkId::Ledger),
        );
        for network in NetworkId::AGGREGATE_ORDER {
            assert_eq!(set.get(network).network(), network);
        }
        let order: Vec<_> = set.iter().map(|p| p.network()).collect();
        assert_eq!(order, NetworkId::AGGREGATE_ORDER.to_vec());
    }
}
