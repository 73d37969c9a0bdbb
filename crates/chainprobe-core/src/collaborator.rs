//! Contracts for the per-network clients a probe drives.
//!
//! Probes only see these traits; concrete HTTP clients live in the
//! `chainprobe-clients` crate and tests use deterministic doubles.

use crate::errors::CollaboratorError;

/// An account address on some network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub address: String,
}

impl Identity {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// A payment with fees filled in, ready to be signed and submitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedPayment {
    pub from: Identity,
    pub to: Identity,
    pub amount_drops: u64,
    pub fee_drops: u64,
}

/// What a [`Receipt`] reference identifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    /// Hash of the signed and validated payment.
    Transaction,
    /// Hash of the first validated ledger after an unsigned, simulated
    /// submission.
    ValidatedLedger,
}

/// Proof that a submitted payment was accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub reference: String,
    pub settled: Settled,
}

/// Ledger-based payment network.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Opens a session against the network. The connection must be released
    /// with [`LedgerConnection::disconnect`].
    async fn connect(&self) -> Result<Box<dyn LedgerConnection>, CollaboratorError>;
}

/// An open ledger session.
#[async_trait::async_trait]
pub trait LedgerConnection: Send + Sync {
    /// Creates and funds a sending account.
    async fn fund_identity(&self) -> Result<Identity, CollaboratorError>;

    /// Receiving account for the payment.
    fn allocate_identity(&self) -> Identity;

    async fn prepare_payment(
        &self,
        from: &Identity,
        to: &Identity,
        amount_drops: u64,
    ) -> Result<PreparedPayment, CollaboratorError>;

    /// Whether this connection holds keys to sign payments.
    fn signs_payments(&self) -> bool {
        true
    }

    /// Signs, submits and waits for the payment to be validated.
    async fn submit_and_wait(&self, payment: &PreparedPayment)
    -> Result<Receipt, CollaboratorError>;

    async fn disconnect(self: Box<Self>) -> Result<(), CollaboratorError>;
}

/// Account/contract-based network reached through interchangeable endpoints.
#[async_trait::async_trait]
pub trait ContractClient: Send + Sync {
    async fn block_number(&self, endpoint: &str) -> Result<u64, CollaboratorError>;

    /// Current gas price in wei, `None` when the endpoint offers no estimate.
    async fn gas_price(&self, endpoint: &str) -> Result<Option<u128>, CollaboratorError>;

    fn allocate_identity(&self) -> Identity;
}

/// Resource-metered network.
#[async_trait::async_trait]
pub trait MeteredClient: Send + Sync {
    /// Latest block height, `None` when the response carries no header.
    async fn latest_block(&self) -> Result<Option<u64>, CollaboratorError>;

    fn allocate_identity(&self) -> Identity;
}

/// Single reachability call used by the quick-estimate mode.
#[async_trait::async_trait]
pub trait Reachability: Send + Sync {
    async fn ping(&self) -> Result<(), CollaboratorError>;
}
