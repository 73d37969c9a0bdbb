use std::time::Duration;

use crate::network::NetworkId;

/// Errors returned by a network collaborator before a probe normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The endpoint answered with an application-level failure (HTTP status, RPC error).
    #[error("{network} rpc error: {message}")]
    Rpc {
        network: NetworkId,
        message: String,
        status_code: Option<u16>,
    },
    /// Connecting to or reading from the endpoint failed.
    #[error("{network} transport error: {message}")]
    Transport { network: NetworkId, message: String },
    /// The endpoint answered with a shape the client does not understand.
    #[error("{network} protocol error: {message}")]
    Protocol { network: NetworkId, message: String },
}

impl CollaboratorError {
    pub fn rpc(network: NetworkId, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Rpc {
            network,
            message: message.into(),
            status_code,
        }
    }

    pub fn transport(network: NetworkId, message: impl Into<String>) -> Self {
        Self::Transport {
            network,
            message: message.into(),
        }
    }

    pub fn protocol(network: NetworkId, message: impl Into<String>) -> Self {
        Self::Protocol {
            network,
            message: message.into(),
        }
    }

    pub fn network(&self) -> NetworkId {
        match self {
            Self::Rpc { network, .. }
            | Self::Transport { network, .. }
            | Self::Protocol { network, .. } => *network,
        }
    }

    /// Message without the network prefix, as shown to the consumer.
    pub fn message(&self) -> &str {
        match self {
            Self::Rpc { message, .. }
            | Self::Transport { message, .. }
            | Self::Protocol { message, .. } => message,
        }
    }
}

/// Failure of one probe step. Never crosses the probe boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// A step did not finish within its allotted duration.
    #[error("{step} timeout after {}s", .after.as_secs_f64())]
    Timeout { step: &'static str, after: Duration },
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    /// No candidate endpoint answered.
    #[error("all {network} endpoints failed: {last}")]
    EndpointsExhausted { network: NetworkId, last: String },
}

impl ProbeError {
    /// Reason string reported in failure events and outcomes.
    pub fn reason(&self) -> String {
        match self {
            Self::Collaborator(err) => err.message().to_string(),
            other => other.to_string(),
        }
    }
}

/// Errors on the producer or consumer side of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// An event could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
    /// The consumer stopped reading.
    #[error("stream closed: {0}")]
    Closed(String),
    /// Reading the byte stream failed.
    #[error("read error: {0}")]
    Read(String),
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
