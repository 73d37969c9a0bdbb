use std::time::Duration;

use crate::network::NetworkId;

/// Fee and latency reported for a network when no measurement is available.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fallback {
    pub fee: f64,
    pub elapsed_seconds: f64,
}

impl Fallback {
    pub const fn new(fee: f64, elapsed_seconds: f64) -> Self {
        Self {
            fee,
            elapsed_seconds,
        }
    }

    /// Fallback pair for a network.
    pub const fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Ledger => Self::new(0.001, 4.5),
            NetworkId::Contract => Self::new(5.4, 45.0),
            NetworkId::Metered => Self::new(1.2, 30.0),
        }
    }
}

/// Terminal record of one probe.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Outcome {
    pub network: NetworkId,
    pub fee: f64,
    #[serde(rename = "time")]
    pub elapsed_seconds: f64,
    #[serde(rename = "success")]
    pub succeeded: bool,
    #[serde(
        rename = "transactionHash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference: Option<String>,
    #[serde(rename = "error", default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Outcome {
    pub fn succeeded(
        network: NetworkId,
        fee: f64,
        elapsed: Duration,
        reference: Option<String>,
    ) -> Self {
        Self {
            network,
            fee: non_negative(fee),
            elapsed_seconds: round_to(elapsed.as_secs_f64(), 2),
            succeeded: true,
            reference,
            failure_reason: None,
        }
    }

    /// Failed outcome: fallback fee, measured elapsed time.
    pub fn failed(network: NetworkId, elapsed: Duration, reason: impl Into<String>) -> Self {
        let fallback = Fallback::for_network(network);
        Self {
            network,
            fee: fallback.fee,
            elapsed_seconds: round_to(elapsed.as_secs_f64(), 2),
            succeeded: false,
            reference: None,
            failure_reason: Some(reason.into()),
        }
    }

    /// Failed outcome for a probe that never produced a measurement.
    pub fn unmeasured(network: NetworkId, reason: impl Into<String>) -> Self {
        let fallback = Fallback::for_network(network);
        Self {
            network,
            fee: fallback.fee,
            elapsed_seconds: fallback.elapsed_seconds,
            succeeded: false,
            reference: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    non_negative((value * factor).round() / factor)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_uses_fallback_fee_and_measured_time() {
        let outcome = Outcome::failed(NetworkId::Contract, Duration::from_millis(1234), "boom");
        assert!(!outcome.succeeded);
        assert_eq!(outcome.fee, 5.4);
        assert_eq!(outcome.elapsed_seconds, 1.23);
        assert_eq!(outcome.failure_reason.as_deref(), Some("boom"));
    }

    #[test]
    fn unmeasured_outcome_uses_both_fallback_figures() {
        let outcome = Outcome::unmeasured(NetworkId::Metered, "task aborted");
        assert_eq!(outcome.fee, 1.2);
        assert_eq!(outcome.elapsed_seconds, 30.0);
    }

    #[test]
    fn non_finite_fee_is_clamped() {
        let outcome = Outcome::succeeded(NetworkId::Ledger, f64::NAN, Duration::ZERO, None);
        assert_eq!(outcome.fee, 0.0);
    }

    #[test]
    fn serializes_with_consumer_field_names() {
        let outcome = Outcome::succeeded(
            NetworkId::Metered,
            0.12,
            Duration::from_millis(7010),
            Some("TRC20-5".into()),
        );
        let value = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "network": "Tron",
                "fee": 0.12,
                "time": 7.01,
                "success": true,
                "transactionHash": "TRC20-5",
            })
        );
    }
}
