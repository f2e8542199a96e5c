//! Hex address syntax and mixed-case checksum checks.

use std::collections::BTreeMap;

use alloy::primitives::Address;

use crate::report::ValidationReport;

/// File extension of a record's storage key
pub const RECORD_EXTENSION: &str = ".json";

/// Check that `address` is `0x`/`0X` followed by 40 hex digits, and that a
/// mixed-case payload carries the correct EIP-55 checksum.
///
/// All-lowercase and all-uppercase payloads are accepted without asserting a
/// checksum.
pub fn is_valid_address(address: &str) -> bool {
    let Some(payload) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return false;
    };

    if payload.len() != 40 || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
        return false;
    }

    let has_upper = payload.bytes().any(|b| b.is_ascii_uppercase());
    let has_lower = payload.bytes().any(|b| b.is_ascii_lowercase());
    if !(has_upper && has_lower) {
        return true;
    }

    match payload.to_ascii_lowercase().parse::<Address>() {
        Ok(parsed) => parsed.to_checksum(None)[2..] == *payload,
        Err(_) => false,
    }
}

/// Parse an address string without asserting its checksum.
///
/// Callers that need the checksum asserted run [`is_valid_address`] first.
pub fn parse_address(address: &str) -> Option<Address> {
    let payload = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))?;
    format!("0x{}", payload.to_ascii_lowercase()).parse().ok()
}

/// The storage key expected for a record anchored at `config_address`
pub fn expected_filename(config_address: &str) -> String {
    format!("{}{}", config_address.to_lowercase(), RECORD_EXTENSION)
}

/// Check that a record's storage key is its lowercase config address plus
/// the record extension.
pub fn validate_filename(filename: &str, config_address: &str) -> bool {
    filename == expected_filename(config_address)
}

/// Apply [`is_valid_address`] to every entry of both contract maps and to the
/// sequencer address, collecting one error per invalid entry.
pub fn validate_contract_addresses(
    l1_contracts: &BTreeMap<String, String>,
    l2_contracts: &BTreeMap<String, String>,
    sequencer_address: &str,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (name, address) in l1_contracts {
        if !address.is_empty() && !is_valid_address(address) {
            report.push_error(format!("Invalid L1 contract address for {}: {}", name, address));
        }
    }

    for (name, address) in l2_contracts {
        if !address.is_empty() && !is_valid_address(address) {
            report.push_error(format!("Invalid L2 contract address for {}: {}", name, address));
        }
    }

    if !is_valid_address(sequencer_address) {
        report.push_error(format!("Invalid sequencer address: {}", sequencer_address));
    }

    report
}
