//! Typed view of a rollup metadata record.
//!
//! The schema pass runs on the untyped document first; a record is decoded into
//! these types only for the checks that read specific fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Kind of rollup a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupType {
    Optimistic,
    Zk,
    Sovereign,
}

/// Operational status of a rollup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupStatus {
    Active,
    Inactive,
    Maintenance,
    Deprecated,
    Shutdown,
}

/// The two admissible kinds of registry change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Register,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rollup's metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupRecord {
    /// L1 chain the rollup settles to
    pub l1_chain_id: u64,

    /// The rollup's own chain id
    pub l2_chain_id: u64,

    pub name: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    pub rollup_type: RollupType,
    pub stack: StackInfo,
    pub rpc_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,

    pub native_token: NativeToken,
    pub status: RollupStatus,

    /// Initial registration time (RFC 3339), immutable after creation
    pub created_at: String,

    /// Last update time (RFC 3339), strictly increasing across updates
    pub last_updated: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutdown: Option<JsonValue>,

    /// L1-side contracts by name; `SystemConfig` anchors the record identity
    pub l1_contracts: BTreeMap<String, String>,

    /// L2-side contracts by name
    pub l2_contracts: BTreeMap<String, String>,

    pub bridges: Vec<JsonValue>,
    pub explorers: Vec<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_resources: Option<JsonValue>,

    pub sequencer: SequencerInfo,
    pub staking: StakingInfo,
    pub network_config: JsonValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawal_config: Option<JsonValue>,

    pub metadata: Authorization,
}

/// Technology stack a rollup is built on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackInfo {
    pub name: String,
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zk_proof_system: Option<String>,
}

/// Native token type of an L2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeTokenType {
    Eth,
    Erc20,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeToken {
    #[serde(rename = "type")]
    pub token_type: NativeTokenType,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,

    /// L1 token contract; required when the token is ERC20
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coingecko_id: Option<String>,
}

/// Sequencer and operator addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerInfo {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batcher_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposer_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregator_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_sequencer: Option<String>,
}

/// Staking candidacy of a rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingInfo {
    pub is_candidate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_registered_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_status: Option<String>,

    /// Transaction that registered the config contract with the staking registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_tx_hash: Option<String>,

    /// Candidate contract created by the registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollup_config_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staking_service_name: Option<String>,
}

/// Signature block proving the sequencer authorized the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    /// Schema version of the record
    pub version: String,

    /// 65-byte recoverable signature, hex encoded
    pub signature: String,

    /// Address that produced `signature`
    pub signed_by: String,
}

impl RollupRecord {
    /// Decode a record from an untyped document
    pub fn from_json(document: &JsonValue) -> Result<Self, serde_json::Error> {
        Self::deserialize(document)
    }

    /// The config contract address that anchors this record's identity
    pub fn config_address(&self) -> Option<&str> {
        self.l1_contracts.get(SYSTEM_CONFIG_KEY).map(String::as_str)
    }
}

/// Key of the identity-anchoring contract in `l1Contracts`
pub const SYSTEM_CONFIG_KEY: &str = "SystemConfig";

/// Parse an RFC 3339 timestamp into whole unix seconds
pub fn unix_seconds(timestamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|dt| dt.timestamp())
}

/// Render unix seconds as an RFC 3339 UTC string
pub fn iso_timestamp(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| seconds.to_string())
}
