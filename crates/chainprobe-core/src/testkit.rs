//! Deterministic collaborator and probe doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::collaborator::{
    ContractClient, Identity, LedgerClient, LedgerConnection, MeteredClient, PreparedPayment,
    Receipt, Settled,
};
use crate::emitter::ProgressEmitter;
use crate::errors::{CollaboratorError, ProbeError};
use crate::event::Observation;
use crate::network::NetworkId;
use crate::probe::{Probe, Settlement};

#[derive(Clone, Copy, Debug)]
pub(crate) enum LedgerScript {
    Succeed,
    ConnectHangs,
    FundingFails,
    SubmitHangs,
    /// Succeeds without signing keys.
    Unsigned,
}

pub(crate) struct FakeLedger {
    script: LedgerScript,
    disconnects: Arc<AtomicUsize>,
}

impl FakeLedger {
    pub(crate) const HASH: &'static str =
        "E3FE6EA3D48F0C2B639448020EA4F03D4F4F8FFDB243A852A0F59177921B4879";

    pub(crate) fn new(script: LedgerScript) -> Self {
        Self {
            script,
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

struct FakeLedgerConnection {
    script: LedgerScript,
    disconnects: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl LedgerClient for FakeLedger {
    async fn connect(&self) -> Result<Box<dyn LedgerConnection>, CollaboratorError> {
        if let LedgerScript::ConnectHangs = self.script {
            futures::future::pending::<()>().await;
        }
        Ok(Box::new(FakeLedgerConnection {
            script: self.script,
            disconnects: self.disconnects.clone(),
        }))
    }
}

#[async_trait::async_trait]
impl LedgerConnection for FakeLedgerConnection {
    async fn fund_identity(&self) -> Result<Identity, CollaboratorError> {
        match self.script {
            LedgerScript::FundingFails => Err(CollaboratorError::rpc(
                NetworkId::Ledger,
                "faucet unavailable",
                Some(503),
            )),
            _ => Ok(Identity::new("rFUNDEDxxxxxxxxxxxxxxxxxxxxxxxxxx")),
        }
    }

    fn allocate_identity(&self) -> Identity {
        Identity::new("rRECEIVERxxxxxxxxxxxxxxxxxxxxxxxx")
    }

    fn signs_payments(&self) -> bool {
        !matches!(self.script, LedgerScript::Unsigned)
    }

    async fn prepare_payment(
        &self,
        from: &Identity,
        to: &Identity,
        amount_drops: u64,
    ) -> Result<PreparedPayment, CollaboratorError> {
        Ok(PreparedPayment {
            from: from.clone(),
            to: to.clone(),
            amount_drops,
            fee_drops: 1_000,
        })
    }

    async fn submit_and_wait(
        &self,
        _payment: &PreparedPayment,
    ) -> Result<Receipt, CollaboratorError> {
        if let LedgerScript::SubmitHangs = self.script {
            futures::future::pending::<()>().await;
        }
        let settled = match self.script {
            LedgerScript::Unsigned => Settled::ValidatedLedger,
            _ => Settled::Transaction,
        };
        Ok(Receipt {
            reference: FakeLedger::HASH.to_string(),
            settled,
        })
    }

    async fn disconnect(self: Box<Self>) -> Result<(), CollaboratorError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FakeContract {
    block: u64,
    gas_price: Option<u128>,
    down: HashSet<String>,
    queried: Mutex<Vec<String>>,
    next_identity: AtomicUsize,
}

impl FakeContract {
    pub(crate) fn new(block: u64) -> Self {
        Self {
            block,
            gas_price: Some(20_000_000_000),
            down: HashSet::new(),
            queried: Mutex::new(Vec::new()),
            next_identity: AtomicUsize::new(0),
        }
    }

    pub(crate) fn down(mut self, endpoint: &str) -> Self {
        self.down.insert(endpoint.to_string());
        self
    }

    pub(crate) fn without_gas_price(mut self) -> Self {
        self.gas_price = None;
        self
    }

    pub(crate) fn queried_endpoints(&self) -> Vec<String> {
        self.queried.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ContractClient for FakeContract {
    async fn block_number(&self, endpoint: &str) -> Result<u64, CollaboratorError> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(endpoint.to_string());
        }
        if self.down.contains(endpoint) {
            return Err(CollaboratorError::transport(
                NetworkId::Contract,
                format!("{endpoint} unreachable"),
            ));
        }
        Ok(self.block)
    }

    async fn gas_price(&self, _endpoint: &str) -> Result<Option<u128>, CollaboratorError> {
        Ok(self.gas_price)
    }

    fn allocate_identity(&self) -> Identity {
        let n = self.next_identity.fetch_add(1, Ordering::SeqCst);
        Identity::new(format!("0x{n:040x}"))
    }
}

pub(crate) enum FakeMetered {
    Block(Option<u64>),
    Status(u16),
    Hanging,
}

impl FakeMetered {
    pub(crate) fn at_block(block: Option<u64>) -> Self {
        Self::Block(block)
    }

    pub(crate) fn failing(status: u16) -> Self {
        Self::Status(status)
    }

    pub(crate) fn hanging() -> Self {
        Self::Hanging
    }
}

#[async_trait::async_trait]
impl MeteredClient for FakeMetered {
    async fn latest_block(&self) -> Result<Option<u64>, CollaboratorError> {
        match self {
            Self::Block(block) => Ok(*block),
            Self::Status(status) => Err(CollaboratorError::rpc(
                NetworkId::Metered,
                format!("Tron API error: {status}"),
                Some(*status),
            )),
            Self::Hanging => {
                futures::future::pending::<()>().await;
                Ok(None)
            }
        }
    }

    fn allocate_identity(&self) -> Identity {
        Identity::new("TFAKEADDRESS0000000000000000000000")
    }
}

/// Probe that narrates `steps` times, waiting `delay` in total, then settles
/// or fails.
pub(crate) struct PacedProbe {
    pub(crate) network: NetworkId,
    pub(crate) delay: Duration,
    pub(crate) steps: usize,
    pub(crate) fail: bool,
    pub(crate) panic: bool,
}

impl PacedProbe {
    pub(crate) fn new(network: NetworkId, delay: Duration) -> Self {
        Self {
            network,
            delay,
            steps: 3,
            fail: false,
            panic: false,
        }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub(crate) fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    pub(crate) fn silent(mut self) -> Self {
        self.steps = 0;
        self
    }
}

#[async_trait::async_trait]
impl Probe for PacedProbe {
    fn network(&self) -> NetworkId {
        self.network
    }

    async fn execute(&self, emitter: &ProgressEmitter) -> Result<Settlement, ProbeError> {
        let per_step = self.delay / (self.steps.max(1) as u32);
        for n in 0..self.steps {
            emitter.observe(
                format!("step {n}"),
                Observation::BlockHeight {
                    block_number: n as u64,
                },
            );
            tokio::time::sleep(per_step).await;
        }
        if self.steps == 0 {
            tokio::time::sleep(self.delay).await;
        }
        if self.panic {
            panic!("collaborator exploded");
        }
        if self.fail {
            return Err(CollaboratorError::transport(self.network, "unreachable").into());
        }
        Ok(Settlement {
            fee: 0.5,
            reference: Some(format!("{}-ref", self.network.selector())),
        })
    }
}
