/*!
# Rollup Registry Validator

This crate decides whether a proposed change to the rollup metadata registry
is admissible. The registry keeps one JSON record per L2, filed under
`data/{network}/{config address}.json`, and every change is either a
register (new record) or an update (mutation of an existing one).

## Architecture
- Structural checks: the record schema plus stack-specific contract sets
- Address syntax and EIP-55 checksum checks
- Sequencer authorization: a signed message recovered to `signedBy` and
  cross-checked against the config contract's current sequencer
- Timestamp consistency and strict ordering across updates
- Immutability of identity fields against the previously accepted version
- Staking candidacy verified against its registration transaction

All checks feed one [`ValidationReport`]; no check stops the others.
*/

pub mod address;
pub mod chain;
pub mod config;
pub mod error;
pub mod immutability;
pub mod network;
pub mod pipeline;
pub mod previous;
pub mod record;
pub mod report;
pub mod schema;
pub mod signature;
pub mod timestamp;

pub use chain::{ChainReader, ChainStateReader, RpcChainReader, TxReceipt};
pub use config::{NetworkConfig, RegistryConfig};
pub use error::{
    AuthorizationError, ChainStateError, ConsistencyError, ImmutabilityError, RegistryError,
    RegistryResult, TemporalError,
};
pub use network::{Network, OperationTag, RecordLocation};
pub use pipeline::{RegistryValidator, ValidationRequest};
pub use previous::{InMemoryRecords, NoPreviousRecords, PreviousRecordSource, RawContentSource};
pub use record::{Operation, RollupRecord};
pub use report::ValidationReport;
pub use schema::{SchemaChecker, SchemaViolation};
pub use signature::{Clock, FixedClock, SystemClock};
