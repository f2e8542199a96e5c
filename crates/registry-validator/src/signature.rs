//! Sequencer authorization of a register/update.
//!
//! The sequencer signs a fixed text message with the standard Ethereum
//! personal-message scheme. Two message formats are accepted, tried in
//! order: the legacy format without a timestamp, then the timestamped format
//! using the exact timestamp the record declares. A recovered signer must
//! equal both the record's `signedBy` and the config contract's current
//! sequencer.

use std::sync::OnceLock;

use alloy::primitives::{hex, Address, Signature};
use chrono::Utc;
use regex::Regex;
use tracing::debug;

use crate::address::parse_address;
use crate::chain::ChainStateReader;
use crate::error::AuthorizationError;
use crate::record::{iso_timestamp, unix_seconds, Operation, RollupRecord};
use crate::timestamp::validate_timestamp_consistency;

/// First line of every registry message
pub const MESSAGE_HEADER: &str = "Tokamak Rollup Registry";

/// Largest accepted signature age, in seconds (exclusive)
pub const MAX_SIGNATURE_AGE_SECS: i64 = 86_400;

/// Tolerated clock skew for signatures dated in the future, in seconds
pub const MAX_FUTURE_SKEW_SECS: i64 = 300;

/// Source of the current time for signature age checks
pub trait Clock: Send + Sync {
    /// Current unix time in whole seconds
    fn now_unix(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at a given unix time
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}

/// The record fields every message format signs over
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFields {
    pub l1_chain_id: u64,
    pub l2_chain_id: u64,
    pub operation: Operation,
    /// Config contract address, lowercased
    pub config_address: String,
}

impl MessageFields {
    pub fn from_record(record: &RollupRecord, operation: Operation) -> Self {
        Self {
            l1_chain_id: record.l1_chain_id,
            l2_chain_id: record.l2_chain_id,
            operation,
            config_address: record.config_address().unwrap_or_default().to_lowercase(),
        }
    }
}

/// A signed message layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Legacy,
    /// Legacy text plus a trailing unix timestamp
    Timestamped(i64),
}

impl MessageFormat {
    /// The exact text signed under this format
    pub fn text(&self, fields: &MessageFields) -> String {
        let base = format!(
            "{}\nL1 Chain ID: {}\nL2 Chain ID: {}\nOperation: {}\nSystemConfig: {}",
            MESSAGE_HEADER,
            fields.l1_chain_id,
            fields.l2_chain_id,
            fields.operation,
            fields.config_address
        );

        match self {
            MessageFormat::Legacy => base,
            MessageFormat::Timestamped(timestamp) => format!("{}\nTimestamp: {}", base, timestamp),
        }
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self {
            MessageFormat::Legacy => None,
            MessageFormat::Timestamped(timestamp) => Some(*timestamp),
        }
    }
}

/// Kinds of message format, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatKind {
    Legacy,
    Timestamped,
}

const FORMAT_ORDER: [FormatKind; 2] = [FormatKind::Legacy, FormatKind::Timestamped];

/// Recover the address that signed `message` with the personal-message scheme
pub fn recover_signer(signature: &Signature, message: &str) -> Option<Address> {
    signature.recover_address_from_msg(message.as_bytes()).ok()
}

/// Timestamp a timestamped signature must carry: `createdAt` for a register,
/// `lastUpdated` for an update
pub fn expected_signing_timestamp(
    record: &RollupRecord,
    operation: Operation,
) -> Result<i64, AuthorizationError> {
    let (field, value) = match operation {
        Operation::Register => ("createdAt", &record.created_at),
        Operation::Update => ("lastUpdated", &record.last_updated),
    };

    unix_seconds(value).ok_or_else(|| AuthorizationError::UnreadableTimestamp {
        field,
        value: value.clone(),
    })
}

fn signature_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[a-fA-F0-9]{130}$").expect("static regex"))
}

fn decode_signature(signature: &str) -> Option<Signature> {
    let bytes = hex::decode(signature).ok()?;
    Signature::try_from(bytes.as_slice()).ok()
}

/// Find the first message format under which the signature recovers to
/// `signedBy`, returning the format and the recovered signer
pub fn select_message_format(
    record: &RollupRecord,
    operation: Operation,
) -> Result<(MessageFormat, Address), AuthorizationError> {
    let fields = MessageFields::from_record(record, operation);
    let signature = decode_signature(&record.metadata.signature);
    let signed_by = parse_address(&record.metadata.signed_by);

    let mut failure = AuthorizationError::SignerMismatch;
    for kind in FORMAT_ORDER {
        let format = match kind {
            FormatKind::Legacy => MessageFormat::Legacy,
            FormatKind::Timestamped => {
                MessageFormat::Timestamped(expected_signing_timestamp(record, operation)?)
            }
        };

        let recovered = signature
            .as_ref()
            .and_then(|sig| recover_signer(sig, &format.text(&fields)));

        match recovered {
            Some(signer) if Some(signer) == signed_by => {
                debug!(?format, signer = %signer, "signature recovered");
                return Ok((format, signer));
            }
            _ => {}
        }

        failure = match (format.timestamp(), recovered) {
            (Some(timestamp), None) => AuthorizationError::RecoveryFailed {
                timestamp,
                iso: iso_timestamp(timestamp),
            },
            (Some(timestamp), Some(_)) => AuthorizationError::UnrecognizedMessage {
                timestamp,
                iso: iso_timestamp(timestamp),
            },
            (None, _) => AuthorizationError::SignerMismatch,
        };
    }

    Err(failure)
}

/// Check a signature's age against the accepted window
pub fn validate_signature_age(timestamp: i64, now: i64) -> Result<(), AuthorizationError> {
    let age = now - timestamp;
    if age >= MAX_SIGNATURE_AGE_SECS {
        return Err(AuthorizationError::SignatureExpired { hours: age / 3600 });
    }
    if age < -MAX_FUTURE_SKEW_SECS {
        return Err(AuthorizationError::SignatureInFuture);
    }
    Ok(())
}

/// Verify the sequencer's authorization of `record` for `operation`
pub async fn validate_sequencer_signature(
    record: &RollupRecord,
    operation: Operation,
    chain: &ChainStateReader,
    clock: &dyn Clock,
) -> Result<(), AuthorizationError> {
    let on_chain_sequencer = chain
        .validate_on_chain_sequencer(record)
        .await
        .map_err(AuthorizationError::OnChain)?;

    if !signature_regex().is_match(&record.metadata.signature) {
        return Err(AuthorizationError::InvalidSignatureFormat);
    }

    let (format, signer) = select_message_format(record, operation)?;

    if let Some(timestamp) = format.timestamp() {
        validate_signature_age(timestamp, clock.now_unix())?;
        validate_timestamp_consistency(record, timestamp, operation)
            .map_err(AuthorizationError::Temporal)?;
    }

    if parse_address(&record.metadata.signed_by) != Some(signer) {
        return Err(AuthorizationError::SignerMismatch);
    }

    if signer != on_chain_sequencer {
        return Err(AuthorizationError::NotOnChainSequencer {
            signer,
            sequencer: on_chain_sequencer,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use serde_json::json;

    const T0: i64 = 1_735_689_600;

    fn create_test_record(signer: &PrivateKeySigner) -> RollupRecord {
        serde_json::from_value(json!({
            "l1ChainId": 11155111,
            "l2ChainId": 17001,
            "name": "Example L2",
            "description": "An example rollup",
            "rollupType": "optimistic",
            "stack": { "name": "op-stack", "version": "1.0.0" },
            "rpcUrl": "https://rpc.example.org",
            "nativeToken": { "type": "eth", "symbol": "ETH", "name": "Ether", "decimals": 18 },
            "status": "active",
            "createdAt": "2025-01-01T00:00:00Z",
            "lastUpdated": "2025-01-01T00:00:00Z",
            "l1Contracts": { "SystemConfig": "0xAbCd567890123456789012345678901234561234" },
            "l2Contracts": {},
            "bridges": [],
            "explorers": [],
            "sequencer": { "address": signer.address().to_string() },
            "staking": { "isCandidate": false },
            "networkConfig": {},
            "metadata": {
                "version": "1.0.0",
                "signature": "",
                "signedBy": signer.address().to_string()
            }
        }))
        .unwrap()
    }

    fn sign(signer: &PrivateKeySigner, message: &str) -> String {
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        format!("0x{}", hex::encode(signature.as_bytes()))
    }

    #[test]
    fn test_message_text_uses_lowercase_config() {
        let fields = MessageFields {
            l1_chain_id: 11155111,
            l2_chain_id: 17001,
            operation: Operation::Register,
            config_address: "0xabcd567890123456789012345678901234561234".to_string(),
        };

        assert_eq!(
            MessageFormat::Legacy.text(&fields),
            "Tokamak Rollup Registry\nL1 Chain ID: 11155111\nL2 Chain ID: 17001\nOperation: register\nSystemConfig: 0xabcd567890123456789012345678901234561234"
        );
        assert!(MessageFormat::Timestamped(T0)
            .text(&fields)
            .ends_with("\nTimestamp: 1735689600"));

        let signer = PrivateKeySigner::random();
        let record = create_test_record(&signer);
        assert_eq!(
            MessageFields::from_record(&record, Operation::Register).config_address,
            fields.config_address
        );
    }

    #[test]
    fn test_legacy_format_is_tried_first() {
        let signer = PrivateKeySigner::random();
        let mut record = create_test_record(&signer);
        let fields = MessageFields::from_record(&record, Operation::Register);
        record.metadata.signature = sign(&signer, &MessageFormat::Legacy.text(&fields));

        let (format, recovered) = select_message_format(&record, Operation::Register).unwrap();
        assert_eq!(format, MessageFormat::Legacy);
        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_timestamped_format_uses_declared_timestamp() {
        let signer = PrivateKeySigner::random();
        let mut record = create_test_record(&signer);
        let fields = MessageFields::from_record(&record, Operation::Register);
        record.metadata.signature = sign(&signer, &MessageFormat::Timestamped(T0).text(&fields));

        let (format, _) = select_message_format(&record, Operation::Register).unwrap();
        assert_eq!(format, MessageFormat::Timestamped(T0));

        // Signed one second off: no format recovers to signedBy
        record.metadata.signature = sign(&signer, &MessageFormat::Timestamped(T0 + 1).text(&fields));
        let err = select_message_format(&record, Operation::Register).unwrap_err();
        assert!(matches!(err, AuthorizationError::UnrecognizedMessage { timestamp: T0, .. }));
    }

    #[test]
    fn test_other_signer_is_not_accepted() {
        let signer = PrivateKeySigner::random();
        let intruder = PrivateKeySigner::random();
        let mut record = create_test_record(&signer);
        let fields = MessageFields::from_record(&record, Operation::Register);
        record.metadata.signature = sign(&intruder, &MessageFormat::Legacy.text(&fields));

        assert!(select_message_format(&record, Operation::Register).is_err());
    }

    #[test]
    fn test_signature_age_window() {
        assert!(validate_signature_age(T0, T0 + 86_399).is_ok());
        assert_eq!(
            validate_signature_age(T0, T0 + 86_400),
            Err(AuthorizationError::SignatureExpired { hours: 24 })
        );
        assert!(validate_signature_age(T0, T0 - 299).is_ok());
        assert!(validate_signature_age(T0, T0 - 300).is_ok());
        assert_eq!(
            validate_signature_age(T0, T0 - 301),
            Err(AuthorizationError::SignatureInFuture)
        );
    }

    #[test]
    fn test_expected_timestamp_follows_operation() {
        let signer = PrivateKeySigner::random();
        let mut record = create_test_record(&signer);
        record.last_updated = "2025-01-02T00:00:00Z".to_string();

        assert_eq!(expected_signing_timestamp(&record, Operation::Register), Ok(T0));
        assert_eq!(expected_signing_timestamp(&record, Operation::Update), Ok(T0 + 86_400));
    }
}
