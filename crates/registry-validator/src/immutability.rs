//! Identity fields that an update may not change.

use serde_json::Value as JsonValue;

use crate::error::ImmutabilityError;

/// An identity field: JSON pointer into the record and its display name
#[derive(Debug, Clone, Copy)]
pub struct ImmutableField {
    pub pointer: &'static str,
    pub name: &'static str,
}

/// Fields fixed at registration
pub const IMMUTABLE_FIELDS: &[ImmutableField] = &[
    ImmutableField { pointer: "/l1ChainId", name: "L1 Chain ID" },
    ImmutableField { pointer: "/l2ChainId", name: "L2 Chain ID" },
    ImmutableField { pointer: "/l1Contracts/SystemConfig", name: "SystemConfig address" },
    ImmutableField { pointer: "/rollupType", name: "Rollup type" },
    ImmutableField { pointer: "/stack/name", name: "Stack name" },
    ImmutableField { pointer: "/createdAt", name: "Creation timestamp" },
];

fn render(value: Option<&JsonValue>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Compare a proposed record with the previously accepted one and collect
/// every protected-field change.
///
/// With no previous record there is nothing to protect. A field whose
/// previous value is absent is not protected.
pub fn validate_immutable_fields(
    proposed: &JsonValue,
    previous: Option<&JsonValue>,
) -> Vec<ImmutabilityError> {
    let Some(previous) = previous else {
        return Vec::new();
    };

    if !previous.is_object() {
        return vec![ImmutabilityError::Malformed(
            "previous record is not a JSON object".to_string(),
        )];
    }

    let mut errors = Vec::new();

    for field in IMMUTABLE_FIELDS {
        let Some(existing) = previous.pointer(field.pointer) else {
            continue;
        };
        let proposed_value = proposed.pointer(field.pointer);
        if proposed_value != Some(existing) {
            errors.push(ImmutabilityError::FieldChanged {
                field: field.name,
                existing: render(Some(existing)),
                proposed: render(proposed_value),
            });
        }
    }

    let Some(staking) = previous.get("staking").filter(|s| s.is_object()) else {
        errors.push(ImmutabilityError::Malformed(
            "previous record has no staking section".to_string(),
        ));
        return errors;
    };

    let was_candidate = staking.get("isCandidate").and_then(JsonValue::as_bool) == Some(true);
    let existing_tx = staking.get("registrationTxHash").filter(|v| !v.is_null());

    if was_candidate && existing_tx.is_some() {
        let proposed_tx = proposed.pointer("/staking/registrationTxHash");
        if proposed_tx != existing_tx {
            errors.push(ImmutabilityError::RegistrationTxChanged {
                existing: render(existing_tx),
                proposed: render(proposed_tx),
            });
        }

        let existing_candidate = staking.get("candidateAddress");
        let proposed_candidate = proposed.pointer("/staking/candidateAddress");
        if proposed_candidate != existing_candidate {
            errors.push(ImmutabilityError::CandidateAddressChanged {
                existing: render(existing_candidate),
                proposed: render(proposed_candidate),
            });
        }
    }

    errors
}
