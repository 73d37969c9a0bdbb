//! Fee and latency probes for three payment networks, streamed as one
//! ordered sequence of progress events.
//!
//! A session runs one [`Probe`] per network concurrently. Each probe narrates
//! through its [`ProgressEmitter`]; the [`Multiplexer`] forwards that
//! narration as it arrives and closes with a single aggregate result. The
//! [`transport`] module frames events for the wire and [`reassembler`]
//! rebuilds the per-network view on the consumer side.

pub mod collaborator;
pub mod config;
pub mod emitter;
pub mod errors;
pub mod estimate;
pub mod event;
pub mod multiplexer;
pub mod network;
pub mod observability;
pub mod outcome;
pub mod probe;
pub mod probes;
pub mod reassembler;
pub mod transport;

#[cfg(test)]
mod testkit;

pub use config::ProbeConfig;
pub use emitter::ProgressEmitter;
pub use errors::{CollaboratorError, ConfigError, ProbeError, TransportError};
pub use estimate::Estimator;
pub use event::{Event, EventKind, Observation};
pub use multiplexer::{EventWriter, Multiplexer, SessionEnd, SessionReport};
pub use network::{NetworkId, NetworkSelector};
pub use observability::{LogSettings, init_observability};
pub use outcome::Outcome;
pub use probe::{Probe, run_probe};
pub use probes::ProbeSet;
pub use reassembler::SessionView;
