use std::fmt;
use std::str::FromStr;

/// One of the three networks compared by a session.
///
/// Serialized with the short label used on the wire (`XRPL`, `Ethereum`,
/// `Tron`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub enum NetworkId {
    /// Ledger-based payment network.
    #[serde(rename = "XRPL")]
    Ledger,
    /// Account/contract-based smart-contract network.
    #[serde(rename = "Ethereum")]
    Contract,
    /// Resource-metered smart-contract network.
    #[serde(rename = "Tron")]
    Metered,
}

impl NetworkId {
    /// Fixed order of outcomes in every aggregate result.
    pub const AGGREGATE_ORDER: [NetworkId; 3] =
        [NetworkId::Metered, NetworkId::Contract, NetworkId::Ledger];

    /// Short label carried by events.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ledger => "XRPL",
            Self::Contract => "Ethereum",
            Self::Metered => "Tron",
        }
    }

    /// Human-readable name for comparison views.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Ledger => "Ripple (XRPL)",
            Self::Contract => "USDT (Ethereum)",
            Self::Metered => "USDT (Tron)",
        }
    }

    /// Request selector accepted by the HTTP surface.
    pub fn selector(self) -> &'static str {
        match self {
            Self::Ledger => "xrpl",
            Self::Contract => "ethereum",
            Self::Metered => "tron",
        }
    }

    /// Position of this network inside [`NetworkId::AGGREGATE_ORDER`].
    pub fn aggregate_index(self) -> usize {
        match self {
            Self::Metered => 0,
            Self::Contract => 1,
            Self::Ledger => 2,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which probes a request asks for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkSelector {
    One(NetworkId),
    All,
}

impl NetworkSelector {
    /// Every selector string the HTTP surface advertises.
    pub const AVAILABLE: [&'static str; 4] = ["xrpl", "ethereum", "tron", "all"];
}

/// Returned when a selector string names no known network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network selector: {0:?}")]
pub struct UnknownSelector(pub String);

impl FromStr for NetworkSelector {
    type Err = UnknownSelector;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "xrpl" => Ok(Self::One(NetworkId::Ledger)),
            "ethereum" => Ok(Self::One(NetworkId::Contract)),
            "tron" => Ok(Self::One(NetworkId::Metered)),
            "all" => Ok(Self::All),
            other => Err(UnknownSelector(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_index_matches_declared_order() {
        for (idx, network) in NetworkId::AGGREGATE_ORDER.iter().enumerate() {
            assert_eq!(network.aggregate_index(), idx);
        }
    }

    #[test]
    fn serializes_as_wire_label() {
        let json = serde_json::to_string(&NetworkId::Metered).expect("serialize");
        assert_eq!(json, "\"Tron\"");
        let back: NetworkId = serde_json::from_str("\"XRPL\"").expect("deserialize");
        assert_eq!(back, NetworkId::Ledger);
    }

    #[test]
    fn selector_parsing_is_case_sensitive() {
        assert_eq!("all".parse::<NetworkSelector>(), Ok(NetworkSelector::All));
        assert_eq!(
            "tron".parse::<NetworkSelector>(),
            Ok(NetworkSelector::One(NetworkId::Metered))
        );
        assert!("XRPL".parse::<NetworkSelector>().is_err());
        assert!("solana".parse::<NetworkSelector>().is_err());
    }
}
