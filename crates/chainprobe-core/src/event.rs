//! Events streamed from a session to its consumer.
//!
//! The serialized shape is the consumer-visible contract:
//! `{ "type": "log" | "error" | "result", "message"?, "network"?, "data"? }`.

use crate::network::NetworkId;
use crate::outcome::Outcome;

/// Message of the synthetic first event of every session.
pub const STARTING_MESSAGE: &str = "Starting blockchain tests...";
/// Message carried by the aggregate result event.
pub const COMPLETED_MESSAGE: &str = "All tests completed";

/// Numeric or identifying observation attached to a progress event.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Observation {
    BlockHeight {
        #[serde(rename = "blockNumber")]
        block_number: u64,
    },
    Address {
        address: String,
    },
    Fee {
        fee: f64,
    },
    Elapsed {
        #[serde(rename = "elapsedSeconds")]
        elapsed_seconds: f64,
    },
}

/// Payload of the aggregate result event.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AggregateResults {
    pub results: Vec<Outcome>,
}

/// Unit of communication between a session and its consumer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Step narration.
    #[serde(rename = "log")]
    Progress {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        network: Option<NetworkId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Observation>,
    },
    /// A probe failure (labelled) or a session-level failure (unlabelled).
    #[serde(rename = "error")]
    Failure {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        network: Option<NetworkId>,
    },
    /// Final event of a completed session.
    #[serde(rename = "result")]
    AggregateResult {
        #[serde(default = "completed_message")]
        message: String,
        data: AggregateResults,
    },
}

fn completed_message() -> String {
    COMPLETED_MESSAGE.to_string()
}

/// Discriminant of [`Event`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventKind {
    Progress,
    Failure,
    AggregateResult,
}

impl Event {
    pub fn progress(network: NetworkId, message: impl Into<String>) -> Self {
        Self::Progress {
            message: message.into(),
            network: Some(network),
            data: None,
        }
    }

    pub fn observed(network: NetworkId, message: impl Into<String>, data: Observation) -> Self {
        Self::Progress {
            message: message.into(),
            network: Some(network),
            data: Some(data),
        }
    }

    /// Unlabelled first event of a session.
    pub fn starting() -> Self {
        Self::Progress {
            message: STARTING_MESSAGE.to_string(),
            network: None,
            data: None,
        }
    }

    pub fn failure(network: NetworkId, message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            network: Some(network),
        }
    }

    /// Unlabelled terminal failure of a whole session.
    pub fn session_failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            network: None,
        }
    }

    pub fn aggregate(results: Vec<Outcome>) -> Self {
        Self::AggregateResult {
            message: completed_message(),
            data: AggregateResults { results },
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Progress { .. } => EventKind::Progress,
            Self::Failure { .. } => EventKind::Failure,
            Self::AggregateResult { .. } => EventKind::AggregateResult,
        }
    }

    pub fn network(&self) -> Option<NetworkId> {
        match self {
            Self::Progress { network, .. } | Self::Failure { network, .. } => *network,
            Self::AggregateResult { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Progress { message, .. }
            | Self::Failure { message, .. }
            | Self::AggregateResult { message, .. } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn progress_with_observation_matches_wire_shape() {
        let event = Event::observed(
            NetworkId::Contract,
            "Connected to Ethereum. Block: 42",
            Observation::BlockHeight { block_number: 42 },
        );
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "log",
                "message": "Connected to Ethereum. Block: 42",
                "network": "Ethereum",
                "data": { "blockNumber": 42 },
            })
        );
    }

    #[test]
    fn starting_event_has_no_network() {
        let value = serde_json::to_value(Event::starting()).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({ "type": "log", "message": STARTING_MESSAGE })
        );
    }

    #[test]
    fn aggregate_event_carries_results_under_data() {
        let event = Event::aggregate(vec![Outcome::failed(
            NetworkId::Ledger,
            Duration::from_secs(1),
            "Connection timeout",
        )]);
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(value["type"], "result");
        assert_eq!(value["data"]["results"][0]["network"], "XRPL");
        assert_eq!(value["data"]["results"][0]["success"], false);
        assert!(value.get("network").is_none());
    }

    #[test]
    fn observation_variants_are_distinguished_by_field_name() {
        let address: Observation =
            serde_json::from_value(serde_json::json!({ "address": "rXYZ" })).expect("address");
        assert_eq!(address, Observation::Address { address: "rXYZ".into() });
        let elapsed: Observation =
            serde_json::from_value(serde_json::json!({ "elapsedSeconds": 3.5 })).expect("elapsed");
        assert_eq!(elapsed, Observation::Elapsed { elapsed_seconds: 3.5 });
    }

    #[test]
    fn error_event_parses_from_consumer_json() {
        let event: Event = serde_json::from_str(
            r#"{"type":"error","message":"Timeout","network":"Tron"}"#,
        )
        .expect("parse");
        assert_eq!(event.kind(), EventKind::Failure);
        assert_eq!(event.network(), Some(NetworkId::Metered));
    }
}
