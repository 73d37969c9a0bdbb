//! Fans the probes' concurrent narration into one ordered output.
//!
//! Every event is forwarded the moment it is received, in whatever
//! interleaving the scheduler produced. Once every probe has returned, a
//! single aggregate event is written in [`NetworkId::AGGREGATE_ORDER`] and
//! the writer is dropped, closing the stream.

use bytes::Bytes;
use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{Instrument as _, error, info, info_span, warn};

use crate::emitter::{ProgressEmitter, fan_in};
use crate::errors::TransportError;
use crate::event::Event;
use crate::network::NetworkId;
use crate::outcome::Outcome;
use crate::probe::run_probe;
use crate::probes::ProbeSet;
use crate::transport::encode_frame;

/// Single writer of a session's output channel.
#[async_trait::async_trait]
pub trait EventWriter: Send {
    async fn write_event(&mut self, event: &Event) -> Result<(), TransportError>;
}

/// Encodes events into frames and hands them to a response body.
pub struct FrameChannelWriter {
    tx: mpsc::Sender<Bytes>,
}

/// Creates a frame writer and the receiver a response body drains.
pub fn frame_channel(capacity: usize) -> (FrameChannelWriter, mpsc::Receiver<Bytes>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (FrameChannelWriter { tx }, rx)
}

#[async_trait::async_trait]
impl EventWriter for FrameChannelWriter {
    async fn write_event(&mut self, event: &Event) -> Result<(), TransportError> {
        let frame = encode_frame(event)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| TransportError::Closed("consumer disconnected".into()))
    }
}

/// Writer for runs nobody watches.
pub struct DiscardWriter;

#[async_trait::async_trait]
impl EventWriter for DiscardWriter {
    async fn write_event(&mut self, _event: &Event) -> Result<(), TransportError> {
        Ok(())
    }
}

/// How a session's stream ended.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEnd {
    /// The aggregate result was written.
    Completed,
    /// The transport failed; no aggregate result was written.
    Aborted { reason: String },
}

/// Server-side record of one session.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub session_id: uuid::Uuid,
    /// Every event observed, in forwarding order.
    pub log: Vec<Event>,
    /// One outcome per network, in aggregate order.
    pub outcomes: Vec<Outcome>,
    pub end: SessionEnd,
}

/// Runs the three probes of a session and relays their events.
#[derive(Clone)]
pub struct Multiplexer {
    probes: ProbeSet,
}

impl Multiplexer {
    pub fn new(probes: ProbeSet) -> Self {
        Self { probes }
    }

    /// Runs one streamed session. The writer is dropped on return.
    pub async fn run<W: EventWriter>(&self, writer: W) -> SessionReport {
        let session_id = uuid::Uuid::new_v4();
        self.run_session(session_id, writer)
            .instrument(info_span!("session", %session_id))
            .await
    }

    /// Runs all probes without narration and returns their outcomes.
    pub async fn run_quiet(&self) -> Vec<Outcome> {
        self.run(DiscardWriter).await.outcomes
    }

    /// Runs a single network's probe without narration.
    pub async fn run_single(&self, network: NetworkId) -> Outcome {
        let probe = self.probes.get(network);
        run_probe(probe.as_ref(), &ProgressEmitter::detached(network)).await
    }

    async fn run_session<W: EventWriter>(&self, session_id: uuid::Uuid, writer: W) -> SessionReport {
        info!("session started");
        let mut relay = Relay {
            writer,
            log: Vec::new(),
            failure: None,
        };
        relay.forward(Event::starting()).await;

        let (emitters, mut rx) = fan_in(&NetworkId::AGGREGATE_ORDER);
        let handles: Vec<_> = self
            .probes
            .iter()
            .zip(emitters)
            .map(|(probe, emitter)| {
                let probe = probe.clone();
                let network = probe.network();
                let handle = tokio::spawn(async move { run_probe(probe.as_ref(), &emitter).await });
                (network, handle)
            })
            .collect();

        // Each task owns its emitter; the receiver closes once all have returned.
        while let Some(event) = rx.recv().await {
            relay.forward(event).await;
        }

        let joined = join_all(handles.into_iter().map(|(network, handle)| async move {
            match handle.await {
                Ok(outcome) => (outcome, None),
                Err(err) => {
                    error!(network = %network, error = %err, "probe task aborted");
                    let reason = format!("probe task aborted: {err}");
                    (
                        Outcome::unmeasured(network, reason.clone()),
                        Some(Event::failure(network, reason)),
                    )
                }
            }
        }))
        .await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for (outcome, notice) in joined {
            if let Some(notice) = notice {
                relay.forward(notice).await;
            }
            outcomes.push(outcome);
        }

        if relay.failure.is_none() {
            relay.forward(Event::aggregate(outcomes.clone())).await;
        }
        let end = match relay.failure.take() {
            None => SessionEnd::Completed,
            Some(reason) => SessionEnd::Aborted { reason },
        };
        info!(succeeded = outcomes.iter().filter(|o| o.succeeded).count(), ?end, "session finished");

        SessionReport {
            session_id,
            log: relay.log,
            outcomes,
            end,
        }
    }
}

struct Relay<W> {
    writer: W,
    log: Vec<Event>,
    failure: Option<String>,
}

impl<W: EventWriter> Relay<W> {
    /// Writes one event; after the first transport error only records it.
    async fn forward(&mut self, event: Event) {
        if self.failure.is_none()
            && let Err(err) = self.writer.write_event(&event).await
        {
            warn!(error = %err, "transport failed, suppressing further writes");
            let notice = Event::session_failure(err.to_string());
            if self.writer.write_event(&notice).await.is_err() {
                warn!("session failure notice not delivered");
            }
            self.failure = Some(err.to_string());
            self.log.push(event);
            self.log.push(notice);
            return;
        }
        self.log.push(event);
    }
}
