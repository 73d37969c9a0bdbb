use tokio::sync::mpsc;
use tracing::trace;

use crate::event::{Event, Observation};
use crate::network::NetworkId;

/// Receiving half handed to the multiplexer.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Per-probe publishing handle.
///
/// Emission never waits for the consumer: events are queued on an unbounded
/// channel in call order. Every event is stamped with the probe's network.
#[derive(Clone, Debug)]
pub struct ProgressEmitter {
    network: NetworkId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ProgressEmitter {
    pub fn new(network: NetworkId, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { network, tx }
    }

    /// Emitter whose events go nowhere, for runs without live narration.
    pub fn detached(network: NetworkId) -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        Self { network, tx }
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn log(&self, message: impl Into<String>) {
        self.send(Event::progress(self.network, message));
    }

    pub fn observe(&self, message: impl Into<String>, data: Observation) {
        self.send(Event::observed(self.network, message, data));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.send(Event::failure(self.network, message));
    }

    fn send(&self, event: Event) {
        if self.tx.send(event).is_err() {
            trace!(network = %self.network, "event dropped, receiver closed");
        }
    }
}

/// Creates one emitter per network sharing a single receiver.
pub fn fan_in(networks: &[NetworkId]) -> (Vec<ProgressEmitter>, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let emitters = networks
        .iter()
        .map(|network| ProgressEmitter::new(*network, tx.clone()))
        .collect();
    (emitters, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_keep_emission_order_and_label() {
        let (emitters, mut rx) = fan_in(&[NetworkId::Ledger]);
        let emitter = &emitters[0];
        emitter.log("one");
        emitter.observe("two", Observation::BlockHeight { block_number: 7 });
        emitter.fail("three");
        drop(emitters);

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.network(), Some(NetworkId::Ledger));
            seen.push(event.message().to_string());
        }
        assert_eq!(seen, vec!["one", "two", "three"]);
    }

    #[test]
    fn detached_emitter_never_panics() {
        let emitter = ProgressEmitter::detached(NetworkId::Metered);
        emitter.log("nobody listens");
    }
}
