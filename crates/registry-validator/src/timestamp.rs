//! Exact-match and ordering checks on a record's timestamps.

use chrono::DateTime;
use serde_json::Value as JsonValue;

use crate::error::TemporalError;
use crate::record::{unix_seconds, Operation, RollupRecord};

/// Require the signing timestamp to equal the record's declared timestamps,
/// compared as whole seconds.
///
/// A register must match both `createdAt` and `lastUpdated`; an update must
/// match `lastUpdated` only.
pub fn validate_timestamp_consistency(
    record: &RollupRecord,
    signature_timestamp: i64,
    operation: Operation,
) -> Result<(), TemporalError> {
    let fields = match operation {
        Operation::Register => vec![
            ("createdAt", record.created_at.as_str()),
            ("lastUpdated", record.last_updated.as_str()),
        ],
        Operation::Update => vec![("lastUpdated", record.last_updated.as_str())],
    };

    for (field, value) in fields {
        let expected = unix_seconds(value).ok_or_else(|| TemporalError::Unparseable {
            field,
            value: value.to_string(),
        })?;

        if signature_timestamp != expected {
            return Err(TemporalError::Mismatch {
                field,
                signature: signature_timestamp,
                expected,
            });
        }
    }

    Ok(())
}

/// Check a record against the previously accepted version at the same
/// identity.
///
/// A register requires that no previous version exists. An update requires
/// one, and its `lastUpdated` must be strictly later than the previous one.
pub fn validate_update_timestamp(
    record: &RollupRecord,
    previous: Option<&JsonValue>,
    operation: Operation,
    registry_path: &str,
) -> Result<(), TemporalError> {
    match (operation, previous) {
        (Operation::Register, None) => Ok(()),
        (Operation::Register, Some(_)) => {
            Err(TemporalError::PreviousExists(registry_path.to_string()))
        }
        (Operation::Update, None) => Err(TemporalError::PreviousMissing(registry_path.to_string())),
        (Operation::Update, Some(previous)) => {
            let existing = previous
                .get("lastUpdated")
                .and_then(JsonValue::as_str)
                .ok_or_else(|| {
                    TemporalError::PreviousUnreadable("previous record has no lastUpdated".to_string())
                })?;

            let existing_at = DateTime::parse_from_rfc3339(existing).map_err(|e| {
                TemporalError::PreviousUnreadable(format!("previous lastUpdated {}: {}", existing, e))
            })?;
            let proposed_at = DateTime::parse_from_rfc3339(&record.last_updated).map_err(|_| {
                TemporalError::Unparseable {
                    field: "lastUpdated",
                    value: record.last_updated.clone(),
                }
            })?;

            if proposed_at <= existing_at {
                return Err(TemporalError::NotAfterPrevious {
                    existing: existing.to_string(),
                    proposed: record.last_updated.clone(),
                });
            }
            Ok(())
        }
    }
}
