#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{address, hex, Address, Bytes, LogData, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use serde_json::{json, Value};

use rollup_registry_validator::chain::{ChainReader, TxReceipt};
use rollup_registry_validator::error::{ChainResult, ChainStateError};
use rollup_registry_validator::signature::{MessageFields, MessageFormat};
use rollup_registry_validator::{FixedClock, InMemoryRecords, Operation, RegistryValidator, RollupRecord};

sol! {
    interface SystemConfig {
        function unsafeBlockSigner() external view returns (address);
        function nativeTokenAddress() external view returns (address);
    }

    interface Layer2Manager {
        function registerCandidateAddOn(address rollupConfig, uint256 amount, bool flagTon, string memo) external;
        function updateSeigniorage(address rollupConfig) external;

        event RegisteredCandidateAddOn(address rollupConfig, uint256 wtonAmount, string memo, address operator, address candidateAddOn);
    }
}

/// 2025-01-01T00:00:00Z
pub const T0: i64 = 1_735_689_600;

pub const CONFIG_ADDRESS: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const CONFIG: Address = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
pub const STAKING_REGISTRY: Address = address!("58B4C2FEf19f5CDdd944AadD8DC99cCC71bfeFDc");
pub const CANDIDATE: Address = address!("1111111111111111111111111111111111111111");
pub const NATIVE_TOKEN_L1: Address = address!("a30fe40285b8f5c0457dbc3b7c8a280373c40044");

/// In-memory chain keyed by contract address and call selector
#[derive(Default, Clone)]
pub struct MockChain {
    code: HashMap<Address, Bytes>,
    calls: HashMap<(Address, [u8; 4]), Bytes>,
    receipts: HashMap<B256, TxReceipt>,
    inputs: HashMap<B256, Bytes>,
}

impl MockChain {
    /// A deployed config contract designating `sequencer`
    pub fn with_config_contract(sequencer: Address) -> Self {
        Self::default()
            .with_code(CONFIG, Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]))
            .with_call_result(CONFIG, SystemConfig::unsafeBlockSignerCall::SELECTOR, sequencer.abi_encode())
    }

    pub fn with_code(mut self, address: Address, code: Bytes) -> Self {
        self.code.insert(address, code);
        self
    }

    pub fn with_call_result(mut self, to: Address, selector: [u8; 4], result: Vec<u8>) -> Self {
        self.calls.insert((to, selector), Bytes::from(result));
        self
    }

    pub fn with_native_token(self, token: Address) -> Self {
        self.with_call_result(CONFIG, SystemConfig::nativeTokenAddressCall::SELECTOR, token.abi_encode())
    }

    pub fn with_transaction(mut self, hash: B256, receipt: TxReceipt, input: Vec<u8>) -> Self {
        self.receipts.insert(hash, receipt);
        self.inputs.insert(hash, Bytes::from(input));
        self
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn get_code(&self, address: Address) -> ChainResult<Bytes> {
        Ok(self.code.get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainStateError::Transport("short call data".to_string()))?;

        self.calls
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| ChainStateError::Transport("execution reverted".to_string()))
    }

    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>> {
        Ok(self.receipts.get(&hash).cloned())
    }

    async fn transaction_input(&self, hash: B256) -> ChainResult<Option<Bytes>> {
        Ok(self.inputs.get(&hash).cloned())
    }
}

/// Storage path of the fixture record on `network`
pub fn record_path(network: &str) -> String {
    format!("/work/registry/data/{}/{}.json", network, CONFIG_ADDRESS)
}

/// Registry path used to key previous records
pub fn registry_path(network: &str) -> String {
    format!("data/{}/{}.json", network, CONFIG_ADDRESS)
}

pub fn iso(seconds: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(seconds, 0)
        .unwrap()
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// A schema-valid record operated by `sequencer`, created at [`T0`]
pub fn create_test_document(sequencer: Address) -> Value {
    json!({
        "l1ChainId": 11155111,
        "l2ChainId": 111551119090u64,
        "name": "Example L2",
        "description": "An example rollup",
        "logo": "https://example-l2.org/logo.png",
        "website": "https://example-l2.org",
        "rollupType": "optimistic",
        "stack": { "name": "op-stack", "version": "1.9.0" },
        "rpcUrl": "https://rpc.example-l2.org",
        "nativeToken": { "type": "eth", "symbol": "ETH", "name": "Ether", "decimals": 18 },
        "status": "active",
        "createdAt": iso(T0),
        "lastUpdated": iso(T0),
        "l1Contracts": { "SystemConfig": CONFIG_ADDRESS },
        "l2Contracts": { "NativeToken": "0xdeaddeaddeaddeaddeaddeaddeaddeaddead0000" },
        "bridges": [],
        "explorers": [{ "name": "Blockscout", "url": "https://explorer.example-l2.org", "type": "blockscout" }],
        "sequencer": { "address": sequencer.to_string() },
        "staking": { "isCandidate": false },
        "networkConfig": { "blockTime": 2, "gasLimit": "30000000" },
        "metadata": {
            "version": "1.0.0",
            "signature": format!("0x{}", "00".repeat(65)),
            "signedBy": sequencer.to_string()
        }
    })
}

/// Sign `document` for `operation` under `format` and store the signature
pub fn sign_document(document: &mut Value, signer: &PrivateKeySigner, operation: Operation, format: MessageFormat) {
    let record = RollupRecord::from_json(document).unwrap();
    let message = format.text(&MessageFields::from_record(&record, operation));
    let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
    document["metadata"]["signature"] = json!(format!("0x{}", hex::encode(signature.as_bytes())));
}

pub fn create_test_validator(chain: MockChain, previous: InMemoryRecords, now: i64) -> RegistryValidator {
    RegistryValidator::new()
        .unwrap()
        .with_chain_reader(Arc::new(chain))
        .with_previous_source(Arc::new(previous))
        .with_clock(Arc::new(FixedClock(now)))
}

pub fn registration_call(rollup_config: Address) -> Vec<u8> {
    Layer2Manager::registerCandidateAddOnCall {
        rollupConfig: rollup_config,
        amount: U256::from(1_000u64),
        flagTon: true,
        memo: "Example L2".to_string(),
    }
    .abi_encode()
}

pub fn other_call(rollup_config: Address) -> Vec<u8> {
    Layer2Manager::updateSeigniorageCall { rollupConfig: rollup_config }.abi_encode()
}

pub fn registration_event(rollup_config: Address, candidate: Address) -> LogData {
    Layer2Manager::RegisteredCandidateAddOn {
        rollupConfig: rollup_config,
        wtonAmount: U256::from(1_000u64),
        memo: "Example L2".to_string(),
        operator: address!("2222222222222222222222222222222222222222"),
        candidateAddOn: candidate,
    }
    .encode_log_data()
}
