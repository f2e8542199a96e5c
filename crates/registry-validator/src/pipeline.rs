//! Admission pipeline for one proposed record.
//!
//! Every stage runs regardless of earlier failures; the verdict lists all
//! findings in stage order and is valid only when no stage reported an error.

use std::sync::Arc;

use alloy::primitives::Address;
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::address::{expected_filename, is_valid_address, validate_contract_addresses, validate_filename};
use crate::chain::{ChainReader, ChainStateReader, RpcChainReader};
use crate::config::{NetworkConfig, RegistryConfig};
use crate::error::{ConsistencyError, ImmutabilityError, RegistryError, RegistryResult};
use crate::immutability::validate_immutable_fields;
use crate::network::{validate_network_chain_id, Network, OperationTag, RecordLocation};
use crate::previous::{NoPreviousRecords, PreviousRecordSource, RawContentSource};
use crate::record::{NativeToken, NativeTokenType, Operation, RollupRecord, SYSTEM_CONFIG_KEY};
use crate::report::ValidationReport;
use crate::schema::SchemaChecker;
use crate::signature::{validate_sequencer_signature, Clock, SystemClock};
use crate::timestamp::validate_update_timestamp;

/// One proposed change
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// The proposed record, untyped
    pub document: JsonValue,

    /// Storage path of the record (`.../data/{network}/{0xaddress}.json`)
    pub path: String,

    /// Optional operation tag (`[Rollup|Update] {network} {0xaddress} - {name}`)
    pub operation_tag: Option<String>,
}

impl ValidationRequest {
    pub fn new(document: JsonValue, path: impl Into<String>) -> Self {
        Self {
            document,
            path: path.into(),
            operation_tag: None,
        }
    }

    pub fn with_operation_tag(mut self, tag: impl Into<String>) -> Self {
        self.operation_tag = Some(tag.into());
        self
    }
}

/// Runs every admission check against a proposed record
pub struct RegistryValidator {
    schema: SchemaChecker,
    chain: ChainStateReader,
    previous: Arc<dyn PreviousRecordSource>,
    clock: Arc<dyn Clock>,
    staking_registry: Option<Address>,
    public_rpc: Option<Network>,
}

impl RegistryValidator {
    /// A validator with no chain endpoint, no previous records and the
    /// system clock
    pub fn new() -> RegistryResult<Self> {
        Ok(Self {
            schema: SchemaChecker::new()?,
            chain: ChainStateReader::unconfigured(),
            previous: Arc::new(NoPreviousRecords),
            clock: Arc::new(SystemClock),
            staking_registry: None,
            public_rpc: None,
        })
    }

    /// A validator wired to the RPC endpoint and published registry named by
    /// `config`
    pub fn from_config(config: &RegistryConfig) -> RegistryResult<Self> {
        let reader = RpcChainReader::new(&config.rpc_url)?;
        let previous = RawContentSource::new(config.raw_base_url.clone());

        Ok(Self::new()?
            .with_chain_reader(Arc::new(reader))
            .with_previous_source(Arc::new(previous))
            .with_config(config))
    }

    pub fn with_chain_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.chain = ChainStateReader::new(reader);
        self
    }

    pub fn with_previous_source(mut self, source: Arc<dyn PreviousRecordSource>) -> Self {
        self.previous = source;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_staking_registry(mut self, registry: Option<Address>) -> Self {
        self.staking_registry = registry;
        self
    }

    /// Take the staking registry from `config`, and warn on every verdict
    /// when it points at a public RPC
    pub fn with_config(mut self, config: &RegistryConfig) -> Self {
        self.staking_registry = config.staking_registry;
        self.public_rpc = (!config.rpc_is_custom).then_some(config.network);
        self
    }

    /// Run the full pipeline and return the verdict
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationReport {
        let mut report = ValidationReport::new();
        let document = &request.document;
        let location = RecordLocation::from_path(request.path.as_str());

        // Network context
        if location.network_name().is_none() {
            report.record(Err(ConsistencyError::NetworkUnresolved(location.path().to_string())));
        }

        // Schema
        let schema = self.schema.check(document);
        debug!(valid = schema.is_valid(), "schema stage");
        report.merge(schema.errors.iter().collect());

        // Operation tag
        let config_address = document
            .get("l1Contracts")
            .and_then(|contracts| contracts.get(SYSTEM_CONFIG_KEY))
            .and_then(JsonValue::as_str);

        let mut operation = Operation::Register;
        if let Some(title) = &request.operation_tag {
            match OperationTag::parse(title) {
                Ok(tag) => {
                    operation = tag.operation;
                    report.merge(check_tag_consistency(&tag, document, config_address, &location));
                }
                Err(e) => report.record(Err(e)),
            }
        }
        debug!(%operation, "operation resolved");

        // Storage key
        if let Some(config_address) = config_address {
            if !validate_filename(location.filename(), config_address) {
                report.record(Err(ConsistencyError::Filename {
                    expected: expected_filename(config_address),
                    actual: location.filename().to_string(),
                }));
            }
        }

        let record = match RollupRecord::from_json(document) {
            Ok(record) => record,
            Err(e) => {
                report.push_error(format!("Record could not be decoded: {}", e));
                return self.finish(report);
            }
        };

        // Sequencer authorization
        let authorization = validate_sequencer_signature(&record, operation, &self.chain, self.clock.as_ref()).await;
        debug!(ok = authorization.is_ok(), "signature stage");
        report.record(authorization);

        // Address formats
        report.merge(validate_contract_addresses(
            &record.l1_contracts,
            &record.l2_contracts,
            &record.sequencer.address,
        ));

        // Native token
        report.record(check_native_token_declaration(&record.native_token));
        report.record(self.chain.validate_native_token_address(&record).await);

        // Chain id plausibility
        if let Some(network) = location.network_name() {
            report.record(validate_network_chain_id(network, record.l1_chain_id));
        }

        // Previous version
        self.check_against_previous(&mut report, document, &record, operation, &location)
            .await;

        // Staking candidacy
        if record.staking.is_candidate {
            match self.staking_registry {
                Some(registry) => {
                    if let Err(e) = self.chain.validate_staking_registration(&record, registry).await {
                        report.push_error(format!("Staking validation failed: {}", e));
                    }
                }
                None => report.push_warning(format!(
                    "No Layer2ManagerProxy address configured for network {}. Skipping staking validation.",
                    location.network_name().unwrap_or("unknown")
                )),
            }
        }

        self.finish(report)
    }

    async fn check_against_previous(
        &self,
        report: &mut ValidationReport,
        document: &JsonValue,
        record: &RollupRecord,
        operation: Operation,
        location: &RecordLocation,
    ) {
        let previous = self.previous.fetch_previous(location).await;
        let registry_path = location.registry_path();

        match (operation, previous) {
            (_, Ok(previous)) => {
                if operation == Operation::Update {
                    let violations = validate_immutable_fields(document, previous.as_ref());
                    report.merge(violations.into_iter().collect());
                }
                report.record(validate_update_timestamp(
                    record,
                    previous.as_ref(),
                    operation,
                    registry_path,
                ));
            }
            (Operation::Register, Err(e)) => {
                report.push_warning(format!("Could not check for an existing record: {}", e));
            }
            (Operation::Update, Err(RegistryError::MalformedPrevious(reason))) => {
                report.record(Err(ImmutabilityError::Malformed(reason)));
            }
            (Operation::Update, Err(e)) => report.push_error(e.to_string()),
        }
    }

    fn finish(&self, mut report: ValidationReport) -> ValidationReport {
        if let Some(network) = self.public_rpc {
            report.push_warning(format!(
                "Using public RPC for {}. Set {} for higher rate limits.",
                network,
                NetworkConfig::rpc_env_var(network)
            ));
        }

        info!(
            valid = report.is_valid(),
            errors = report.errors().len(),
            warnings = report.warnings().len(),
            "validation finished"
        );
        report
    }
}

/// Cross-check a parsed operation tag against the record and its location
fn check_tag_consistency(
    tag: &OperationTag,
    document: &JsonValue,
    config_address: Option<&str>,
    location: &RecordLocation,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let record_address = config_address.unwrap_or_default();
    if tag.config_address.to_lowercase() != record_address.to_lowercase() {
        report.record(Err(ConsistencyError::TagAddress {
            tag: tag.config_address.clone(),
            record: record_address.to_string(),
        }));
    }

    if let Some(path_network) = location.network_name() {
        if tag.network != path_network {
            report.record(Err(ConsistencyError::TagNetworkMismatch {
                tag: tag.network.clone(),
                path: path_network.to_string(),
            }));
        }
    }

    let record_name = document.get("name").and_then(JsonValue::as_str).unwrap_or_default();
    if tag.rollup_name != record_name {
        report.record(Err(ConsistencyError::TagName {
            tag: tag.rollup_name.clone(),
            record: record_name.to_string(),
        }));
    }

    report
}

/// An ERC20 native token must name a well-formed L1 token contract
fn check_native_token_declaration(token: &NativeToken) -> Result<(), String> {
    if token.token_type != NativeTokenType::Erc20 {
        return Ok(());
    }
    match token.l1_address.as_deref() {
        None | Some("") => Err("ERC20 native token requires l1Address".to_string()),
        Some(address) if !is_valid_address(address) => {
            Err(format!("Invalid ERC20 native token L1 address: {}", address))
        }
        Some(_) => Ok(()),
    }
}
