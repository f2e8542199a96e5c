//! Per-network endpoints and registry addresses.

use alloy::primitives::{address, Address};

use crate::network::Network;

/// Raw-content base URL of the published registry, used to fetch the
/// previously accepted version of a record
pub const DEFAULT_RAW_BASE_URL: &str =
    "https://raw.githubusercontent.com/tokamak-network/tokamak-rollup-metadata-repository/refs/heads/main/";

/// Environment variable overriding [`DEFAULT_RAW_BASE_URL`]
pub const RAW_BASE_URL_ENV: &str = "REGISTRY_RAW_BASE_URL";

/// Static facts about a supported network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Human-readable network name
    pub name: &'static str,

    /// L1 chain id
    pub chain_id: u64,

    /// Public RPC used when no custom endpoint is configured
    pub default_rpc_url: &'static str,

    /// Staking registry (`Layer2ManagerProxy`) that candidacy registrations
    /// must be sent to
    pub staking_registry: Option<Address>,
}

impl NetworkConfig {
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self {
                name: "Ethereum Mainnet",
                chain_id: 1,
                default_rpc_url: "https://ethereum-rpc.publicnode.com",
                staking_registry: Some(address!("D6Bf6B2b7553c8064Ba763AD6989829060FdFC1D")),
            },
            Network::Sepolia => Self {
                name: "Sepolia Testnet",
                chain_id: 11155111,
                default_rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
                staking_registry: Some(address!("58B4C2FEf19f5CDdd944AadD8DC99cCC71bfeFDc")),
            },
            Network::Holesky => Self {
                name: "Holesky Testnet",
                chain_id: 17000,
                default_rpc_url: "https://ethereum-holesky-rpc.publicnode.com",
                staking_registry: None,
            },
        }
    }

    /// Name of the environment variable that overrides this network's RPC
    pub fn rpc_env_var(network: Network) -> String {
        format!("{}_RPC_URL", network.as_str().to_uppercase())
    }
}

/// Resolved configuration for validating records of one network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub network: Network,

    /// RPC endpoint for chain-state reads
    pub rpc_url: String,

    /// Whether `rpc_url` came from the environment rather than the public default
    pub rpc_is_custom: bool,

    /// Staking registry address for this network, if any
    pub staking_registry: Option<Address>,

    /// Base URL of the published registry's raw content
    pub raw_base_url: String,
}

impl RegistryConfig {
    /// Public defaults for `network`
    pub fn defaults(network: Network) -> Self {
        let static_config = NetworkConfig::for_network(network);
        Self {
            network,
            rpc_url: static_config.default_rpc_url.to_string(),
            rpc_is_custom: false,
            staking_registry: static_config.staking_registry,
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
        }
    }

    /// Defaults for `network`, overridden by `{NETWORK}_RPC_URL` and
    /// `REGISTRY_RAW_BASE_URL` when set
    pub fn from_env(network: Network) -> Self {
        let mut config = Self::defaults(network);

        if let Some(url) = non_empty_env(&NetworkConfig::rpc_env_var(network)) {
            config.rpc_url = url;
            config.rpc_is_custom = true;
        }

        if let Some(base) = non_empty_env(RAW_BASE_URL_ENV) {
            config.raw_base_url = base;
        }

        config
    }

    /// Replace the RPC endpoint with an explicitly chosen one
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self.rpc_is_custom = true;
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_network() {
        let sepolia = RegistryConfig::defaults(Network::Sepolia);
        assert!(!sepolia.rpc_is_custom);
        assert_eq!(sepolia.rpc_url, "https://ethereum-sepolia-rpc.publicnode.com");
        assert!(sepolia.staking_registry.is_some());

        let holesky = RegistryConfig::defaults(Network::Holesky);
        assert_eq!(holesky.staking_registry, None);
        assert_eq!(NetworkConfig::for_network(Network::Holesky).chain_id, 17000);
    }

    #[test]
    fn test_rpc_env_var_name() {
        assert_eq!(NetworkConfig::rpc_env_var(Network::Mainnet), "MAINNET_RPC_URL");
    }

    #[test]
    fn test_explicit_rpc_is_custom() {
        let config = RegistryConfig::defaults(Network::Mainnet).with_rpc_url("http://localhost:8545");
        assert!(config.rpc_is_custom);
        assert_eq!(config.rpc_url, "http://localhost:8545");
    }
}
