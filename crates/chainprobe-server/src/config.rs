use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chainprobe_clients::Endpoints;
use chainprobe_core::{ConfigError, ProbeConfig};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Loads `.env` from the crate directory and then the working directory.
pub fn load_dotenv() {
    let _ = dotenvy::from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    dotenvy::dotenv().ok();
}

/// Everything the binary needs, resolved from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub endpoints: Endpoints,
    pub probes: ProbeConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through `lookup`; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = parse_var(&lookup, "CHAINPROBE_BIND")?
            .map_or_else(|| SocketAddr::from_str(DEFAULT_BIND), Ok)
            .map_err(|e| ConfigError::invalid("CHAINPROBE_BIND", e.to_string()))?;

        let mut endpoints = Endpoints::default();
        if let Some(url) = non_empty(&lookup, "CHAINPROBE_LEDGER_RPC") {
            endpoints.ledger_rpc = url;
        }
        if let Some(url) = non_empty(&lookup, "CHAINPROBE_LEDGER_FAUCET") {
            endpoints.ledger_faucet = url;
        }
        if let Some(url) = non_empty(&lookup, "CHAINPROBE_METERED_API") {
            endpoints.metered_api = url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CHAINPROBE_HTTP_TIMEOUT_SECS")? {
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "CHAINPROBE_HTTP_TIMEOUT_SECS",
                    "must be greater than zero",
                ));
            }
            endpoints.http_timeout = Duration::from_secs(secs);
        }

        let mut probes = ProbeConfig::default();
        if let Some(list) = lookup("CHAINPROBE_CONTRACT_RPCS") {
            let urls: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
            if urls.is_empty() {
                return Err(ConfigError::invalid(
                    "CHAINPROBE_CONTRACT_RPCS",
                    "must list at least one endpoint",
                ));
            }
            probes.contract.endpoints = urls;
        }
        if let Some(scale) = parse_var::<f64>(&lookup, "CHAINPROBE_LATENCY_SCALE")? {
            if !scale.is_finite() || scale < 0.0 {
                return Err(ConfigError::invalid(
                    "CHAINPROBE_LATENCY_SCALE",
                    "must be a non-negative number",
                ));
            }
            probes = probes.with_latency_scale(scale);
        }

        Ok(Self {
            bind,
            endpoints,
            probes,
        })
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::invalid(key, format!("{raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainprobe_core::config::SimulatedLatency;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).expect("defaults");
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.probes, ProbeConfig::default());
    }

    #[test]
    fn contract_endpoints_are_comma_separated() {
        let config = config(&[(
            "CHAINPROBE_CONTRACT_RPCS",
            " http://a.example , http://b.example,",
        )])
        .expect("config");
        assert_eq!(
            config.probes.contract.endpoints,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn zero_latency_scale_disables_delays() {
        let config = config(&[("CHAINPROBE_LATENCY_SCALE", "0")]).expect("config");
        assert_eq!(config.probes.contract.latency, SimulatedLatency::none());
    }

    #[test]
    fn parse_errors_name_the_key() {
        let err = config(&[("CHAINPROBE_BIND", "not-an-addr")]).expect_err("bad bind");
        assert!(err.to_string().contains("CHAINPROBE_BIND"));
        let err = config(&[("CHAINPROBE_LATENCY_SCALE", "-1")]).expect_err("negative");
        assert!(err.to_string().contains("CHAINPROBE_LATENCY_SCALE"));
        let err = config(&[("CHAINPROBE_CONTRACT_RPCS", " , ")]).expect_err("empty list");
        assert!(err.to_string().contains("CHAINPROBE_CONTRACT_RPCS"));
    }
}
