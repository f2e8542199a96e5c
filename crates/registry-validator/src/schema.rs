//! Structural validation of rollup metadata documents.
//!
//! Validation runs in two passes. The base pass checks the document against
//! the embedded JSON schema and reports every violation it finds. Only when
//! the base pass succeeds does the stack pass run: a lookup from
//! `(rollupType, stack.name)` to extra contract keys that particular stacks
//! must declare.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::record::RollupType;

/// The record schema, embedded at compile time
pub const RECORD_SCHEMA: &str = include_str!("../schemas/rollup-metadata.schema.json");

/// One structural problem in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON pointer of the offending value (`""` for the root)
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "root" } else { &self.path };
        write!(f, "Schema validation failed at {}: {}", path, self.message)
    }
}

/// Result of checking one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOutcome {
    pub errors: Vec<SchemaViolation>,
}

impl SchemaOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Extra contracts a stack must declare on top of the base schema
#[derive(Debug, Clone, Copy)]
pub struct StackRequirements {
    /// Human-readable stack label used in messages
    pub label: &'static str,
    pub l1_contracts: &'static [&'static str],
    pub l2_contracts: &'static [&'static str],
}

const THANOS_L1_CONTRACTS: &[&str] = &[
    "SystemConfig",
    "ProxyAdmin",
    "AddressManager",
    "SuperchainConfig",
    "DisputeGameFactory",
    "L1CrossDomainMessenger",
    "L1ERC721Bridge",
    "L1StandardBridge",
    "OptimismMintableERC20Factory",
    "OptimismPortal",
    "AnchorStateRegistry",
    "DelayedWETH",
    "L1UsdcBridge",
    "L2OutputOracle",
    "Mips",
    "PermissionedDelayedWETH",
    "PreimageOracle",
    "ProtocolVersions",
    "SafeProxyFactory",
    "SafeSingleton",
    "SystemOwnerSafe",
];

const THANOS_L2_CONTRACTS: &[&str] = &[
    "NativeToken",
    "WETH",
    "L2ToL1MessagePasser",
    "DeployerWhitelist",
    "L2CrossDomainMessenger",
    "GasPriceOracle",
    "L2StandardBridge",
    "SequencerFeeVault",
    "OptimismMintableERC20Factory",
    "L1BlockNumber",
    "L1Block",
    "GovernanceToken",
    "LegacyMessagePasser",
    "L2ERC721Bridge",
    "OptimismMintableERC721Factory",
    "ProxyAdmin",
    "BaseFeeVault",
    "L1FeeVault",
    "ETH",
];

/// Look up the extra requirements of a `(rollupType, stack.name)` pair
pub fn stack_requirements(rollup_type: RollupType, stack_name: &str) -> Option<StackRequirements> {
    match (rollup_type, stack_name) {
        (RollupType::Optimistic, "thanos") => Some(StackRequirements {
            label: "Thanos optimistic rollup",
            l1_contracts: THANOS_L1_CONTRACTS,
            l2_contracts: THANOS_L2_CONTRACTS,
        }),
        _ => None,
    }
}

/// Compiled record schema
pub struct SchemaChecker {
    schema: JSONSchema,
}

impl SchemaChecker {
    /// Compile the embedded record schema
    pub fn new() -> RegistryResult<Self> {
        let schema_value: JsonValue = serde_json::from_str(RECORD_SCHEMA)
            .map_err(|e| RegistryError::SchemaCompilation(e.to_string()))?;

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .should_validate_formats(true)
            .compile(&schema_value)
            .map_err(|e| RegistryError::SchemaCompilation(e.to_string()))?;

        Ok(Self { schema })
    }

    /// Check a document, returning every violation found
    pub fn check(&self, document: &JsonValue) -> SchemaOutcome {
        let mut errors: Vec<SchemaViolation> = match self.schema.validate(document) {
            Ok(()) => Vec::new(),
            Err(violations) => violations
                .map(|err| SchemaViolation {
                    path: err.instance_path.to_string(),
                    message: format_validation_error(&err, document),
                })
                .collect(),
        };

        if errors.is_empty() {
            errors = check_stack_contracts(document);
        }

        debug!(violations = errors.len(), "schema check finished");
        SchemaOutcome { errors }
    }
}

/// Second pass: contracts required by the document's stack
fn check_stack_contracts(document: &JsonValue) -> Vec<SchemaViolation> {
    let rollup_type = document
        .get("rollupType")
        .and_then(|v| serde_json::from_value::<RollupType>(v.clone()).ok());
    let stack_name = document.pointer("/stack/name").and_then(JsonValue::as_str);

    let requirements = match (rollup_type, stack_name) {
        (Some(rollup_type), Some(stack_name)) => stack_requirements(rollup_type, stack_name),
        _ => None,
    };
    let Some(requirements) = requirements else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    for (side, map_key, names) in [
        ("L1", "l1Contracts", requirements.l1_contracts),
        ("L2", "l2Contracts", requirements.l2_contracts),
    ] {
        let declared = document.get(map_key);
        for name in names {
            let address = declared
                .and_then(|map| map.get(*name))
                .and_then(JsonValue::as_str);
            if address.map_or(true, str::is_empty) {
                errors.push(SchemaViolation {
                    path: format!("/{}/{}", map_key, name),
                    message: format!(
                        "Missing required {} contract '{}' for {}",
                        side, name, requirements.label
                    ),
                });
            }
        }
    }

    errors
}

/// Format a validation error in a user-friendly way
fn format_validation_error(err: &ValidationError, instance: &JsonValue) -> String {
    let path = err.instance_path.to_string();
    let path_display = if path.is_empty() { "root" } else { path.as_str() };

    match &err.kind {
        ValidationErrorKind::Required { property } => {
            let property = property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string());
            format!("Missing required property: '{}'", property)
        }
        ValidationErrorKind::Type { .. } => {
            let value = instance.pointer(&path);
            format!(
                "Invalid type for '{}': got {}",
                path_display,
                value.map_or("null".to_string(), |v| v.to_string())
            )
        }
        ValidationErrorKind::Enum { .. } => {
            format!("Invalid value for '{}': must be one of the allowed values", path_display)
        }
        ValidationErrorKind::MinLength { limit } => {
            format!("'{}' is too short: minimum length is {}", path_display, limit)
        }
        ValidationErrorKind::Pattern { pattern } => {
            format!("'{}' does not match the required pattern {}", path_display, pattern)
        }
        ValidationErrorKind::Format { format } => {
            format!("'{}' is not a valid {}", path_display, format)
        }
        _ => err.to_string(),
    }
}
