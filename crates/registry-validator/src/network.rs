//! Network context of a record: where it is stored, which network class its
//! chain id belongs to, and the operation tag that proposes it.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConsistencyError, RegistryError};
use crate::record::Operation;

/// Networks a record can be registered on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
    Holesky,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Holesky => "holesky",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "sepolia" => Ok(Network::Sepolia),
            "holesky" => Ok(Network::Holesky),
            other => Err(RegistryError::UnsupportedNetwork(other.to_string())),
        }
    }
}

/// Networks accepted in an operation tag
pub const TAG_NETWORKS: [&str; 2] = ["mainnet", "sepolia"];

/// Where a proposed record is stored: `.../data/{network}/{0xaddress}.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLocation {
    path: String,
    filename: String,
    network: Option<String>,
}

impl RecordLocation {
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into().replace('\\', "/");
        let filename = path.rsplit('/').next().unwrap_or_default().to_string();
        let network = network_segment_regex()
            .captures(&path)
            .map(|caps| caps[1].to_string());

        Self {
            path,
            filename,
            network,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The raw network directory segment, if the path has one
    pub fn network_name(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// The network directory segment as a supported network
    pub fn network(&self) -> Option<Network> {
        self.network.as_deref().and_then(|n| n.parse().ok())
    }

    /// The registry-relative path (`data/...`) used to look up the previously
    /// accepted version of this record
    pub fn registry_path(&self) -> &str {
        match network_segment_regex().find(&self.path) {
            Some(segment) => {
                let start = segment.start() + usize::from(segment.as_str().starts_with('/'));
                &self.path[start..]
            }
            None => &self.path,
        }
    }
}

fn network_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|/)data/(\w+)/").expect("static regex"))
}

fn operation_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[(Rollup|Update)\]\s+(\w+)\s+(0[xX][a-fA-F0-9]{40})\s+-\s+(.+)$")
            .expect("static regex")
    })
}

/// A parsed review title of the form `[Rollup|Update] {network} {0xaddress} - {name}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTag {
    pub operation: Operation,
    pub network: String,
    /// Config address exactly as written in the tag
    pub config_address: String,
    /// Rollup name, trimmed
    pub rollup_name: String,
}

impl OperationTag {
    /// Parse and validate an operation tag
    pub fn parse(title: &str) -> Result<Self, ConsistencyError> {
        let caps = operation_tag_regex()
            .captures(title)
            .ok_or(ConsistencyError::TagFormat)?;

        let operation = match &caps[1] {
            "Rollup" => Operation::Register,
            _ => Operation::Update,
        };

        let network = caps[2].to_string();
        if !TAG_NETWORKS.contains(&network.as_str()) {
            return Err(ConsistencyError::TagNetwork {
                network,
                allowed: TAG_NETWORKS.join(", "),
            });
        }

        let rollup_name = caps[4].trim().to_string();
        if rollup_name.is_empty() {
            return Err(ConsistencyError::TagEmptyName);
        }

        Ok(Self {
            operation,
            network,
            config_address: caps[3].to_string(),
            rollup_name,
        })
    }

    /// Render the tag back into its canonical title form
    pub fn to_title(&self) -> String {
        let kind = match self.operation {
            Operation::Register => "Rollup",
            Operation::Update => "Update",
        };
        format!("[{}] {} {} - {}", kind, self.network, self.config_address, self.rollup_name)
    }
}

// Seed lists of well-known chain ids. Anything not listed is accepted on
// either network; registry operators extend these as new L2s launch.
const MAINNET_L1_CHAIN_IDS: &[u64] = &[1];
const SEPOLIA_L1_CHAIN_IDS: &[u64] = &[11155111];
const KNOWN_MAINNET_L2_CHAIN_IDS: &[u64] = &[10, 42161, 137, 8453, 324, 1101, 59144];
const KNOWN_TESTNET_L2_CHAIN_IDS: &[u64] = &[420, 421613, 80001, 84531, 280, 1442, 59140];

/// Whether `chain_id` is a well-known mainnet chain
pub fn is_known_mainnet_chain(chain_id: u64) -> bool {
    MAINNET_L1_CHAIN_IDS.contains(&chain_id) || KNOWN_MAINNET_L2_CHAIN_IDS.contains(&chain_id)
}

/// Whether `chain_id` is a well-known testnet chain
pub fn is_known_testnet_chain(chain_id: u64) -> bool {
    SEPOLIA_L1_CHAIN_IDS.contains(&chain_id) || KNOWN_TESTNET_L2_CHAIN_IDS.contains(&chain_id)
}

/// Reject a chain id known to belong to the other network class than the
/// directory it is filed under. Unknown ids pass on either network.
pub fn validate_network_chain_id(network: &str, chain_id: u64) -> Result<(), ConsistencyError> {
    match network {
        "mainnet" if is_known_testnet_chain(chain_id) => {
            Err(ConsistencyError::TestnetChainOnMainnet { chain_id })
        }
        "sepolia" if is_known_mainnet_chain(chain_id) => {
            Err(ConsistencyError::MainnetChainOnTestnet { chain_id })
        }
        _ => Ok(()),
    }
}
