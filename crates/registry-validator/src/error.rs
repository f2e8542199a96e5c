//! Typed failures for each class of registry check.
//!
//! Every check returns one of these instead of panicking; the pipeline renders
//! them through `Display` into the ordered error list of a verdict.

use alloy::primitives::{Address, B256};
use thiserror::Error;

/// Configuration and internal faults that are not findings about a record
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Invalid RPC URL '{0}': {1}")]
    InvalidRpcUrl(String, String),

    #[error("Failed to compile record schema: {0}")]
    SchemaCompilation(String),

    #[error("Previous record fetch failed: {0}")]
    PreviousFetch(String),

    #[error("Previous record is malformed: {0}")]
    MalformedPrevious(String),
}

/// Result type for registry configuration and collaborator operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Failures while reading or cross-checking live chain state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainStateError {
    #[error("RPC provider not configured for this network")]
    RpcUnavailable,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("No contract deployed at address: {0}")]
    NoContractDeployed(Address),

    #[error("Failed to check contract existence: {0}")]
    ExistenceCheckFailed(String),

    #[error("Failed to fetch sequencer address from SystemConfig contract")]
    SequencerUnreadable,

    #[error("Sequencer address mismatch. OnChain: {on_chain:#x}, Metadata: {declared:#x}")]
    SequencerMismatch { on_chain: Address, declared: Address },

    #[error("Native token address mismatch. SystemConfig.nativeTokenAddress(): {on_chain:#x}, Metadata nativeToken.l1Address: {declared:#x}")]
    NativeTokenMismatch { on_chain: Address, declared: Address },

    #[error("Native token address validation failed: {0}")]
    NativeTokenUnreadable(String),

    #[error("Registration transaction hash and candidate address are required when isCandidate is true")]
    CandidacyIncomplete,

    #[error("Transaction not found: {0}")]
    TxNotFound(B256),

    #[error("Transaction was not sent to Layer2ManagerProxy ({expected}), got: {actual}")]
    WrongRecipient { expected: Address, actual: String },

    #[error("Expected registerCandidateAddOn function call, got: {0}")]
    UnexpectedCall(String),

    #[error("rollupConfig parameter ({param}) does not match SystemConfig address ({config})")]
    ParamMismatch { param: Address, config: Address },

    #[error("RegisteredCandidateAddOn event not found in transaction logs")]
    EventNotFound,

    #[error("candidateAddress ({declared}) does not match event candidateAddOn ({event})")]
    CandidateMismatch { declared: Address, event: Address },

    #[error("Event rollupConfig ({event}) does not match SystemConfig address ({config})")]
    EventConfigMismatch { event: Address, config: Address },

    #[error("RPC request failed: {0}")]
    Transport(String),
}

/// Result type for chain-state reads
pub type ChainResult<T> = Result<T, ChainStateError>;

/// Failures of the sequencer signature proof
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("OnChain validation failed: {0}")]
    OnChain(ChainStateError),

    #[error("Invalid signature format")]
    InvalidSignatureFormat,

    #[error("Signature verification failed: {field} is not a valid timestamp: {value}")]
    UnreadableTimestamp { field: &'static str, value: String },

    #[error("Signature verification failed: signature does not match expected timestamp {timestamp} ({iso}). Please ensure you used the same timestamp for both signature generation and metadata fields.")]
    RecoveryFailed { timestamp: i64, iso: String },

    #[error("Signature verification failed: unable to recover valid message format. Expected timestamp: {timestamp} ({iso})")]
    UnrecognizedMessage { timestamp: i64, iso: String },

    #[error("Signature expired: signature is {hours} hours old, maximum allowed is 24 hours. Please generate a new signature.")]
    SignatureExpired { hours: i64 },

    #[error("Signature timestamp is too far in the future. Please check your system time.")]
    SignatureInFuture,

    #[error("{0}")]
    Temporal(TemporalError),

    #[error("Signature verification failed: recovered address does not match signedBy")]
    SignerMismatch,

    #[error("Signature verification failed: signer ({signer:#x}) is not the onchain sequencer ({sequencer:#x})")]
    NotOnChainSequencer { signer: Address, sequencer: Address },
}

/// Failures of timestamp consistency and ordering
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Timestamp mismatch: signature timestamp ({signature}) must exactly match metadata {field} timestamp ({expected}). Please use the same timestamp from signature generation for both signature and metadata {field} field.")]
    Mismatch {
        field: &'static str,
        signature: i64,
        expected: i64,
    },

    #[error("Invalid {field} timestamp: {value}")]
    Unparseable { field: &'static str, value: String },

    #[error("Register operation failed: File already exists in main branch: {0}")]
    PreviousExists(String),

    #[error("Update operation failed: File does not exist in main branch: {0}")]
    PreviousMissing(String),

    #[error("Update timestamp must be after existing timestamp. Existing: {existing}, New: {proposed}")]
    NotAfterPrevious { existing: String, proposed: String },

    #[error("Update timestamp validation failed: {0}")]
    PreviousUnreadable(String),
}

/// Cross-field mismatches between a record and its surroundings
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("Could not extract network from file path: {0}")]
    NetworkUnresolved(String),

    #[error("Filename should be {expected}, got {actual}")]
    Filename { expected: String, actual: String },

    #[error("PR title must follow format: [Rollup] network 0x1234...abcd - L2 Name or [Update] network 0x1234...abcd - L2 Name")]
    TagFormat,

    #[error("Invalid network: {network}. Must be one of: {allowed}")]
    TagNetwork { network: String, allowed: String },

    #[error("Rollup name cannot be empty")]
    TagEmptyName,

    #[error("PR title SystemConfig address ({tag}) does not match metadata SystemConfig address ({record})")]
    TagAddress { tag: String, record: String },

    #[error("PR title network ({tag}) does not match file path network ({path})")]
    TagNetworkMismatch { tag: String, path: String },

    #[error("PR title rollup name ({tag}) does not match metadata name ({record})")]
    TagName { tag: String, record: String },

    #[error("ChainId {chain_id} is a testnet chainId but file is in mainnet directory")]
    TestnetChainOnMainnet { chain_id: u64 },

    #[error("ChainId {chain_id} is a mainnet chainId but file is in sepolia directory")]
    MainnetChainOnTestnet { chain_id: u64 },
}

/// Protected-field mutations detected on update
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImmutabilityError {
    #[error("Immutable field '{field}' cannot be changed during update. Existing: {existing}, New: {proposed}")]
    FieldChanged {
        field: &'static str,
        existing: String,
        proposed: String,
    },

    #[error("Staking registration transaction hash cannot be changed during update. Existing: {existing}, New: {proposed}")]
    RegistrationTxChanged { existing: String, proposed: String },

    #[error("Staking candidate address cannot be changed during update. Existing: {existing}, New: {proposed}")]
    CandidateAddressChanged { existing: String, proposed: String },

    #[error("Failed to validate immutable fields: {0}")]
    Malformed(String),
}
