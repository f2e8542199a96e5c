//! Live chain-state reads backing the authorization and staking checks.
//!
//! [`ChainReader`] is the transport seam: four raw JSON-RPC reads. The
//! production implementation is [`RpcChainReader`] over an alloy HTTP
//! provider; tests substitute an in-memory reader. [`ChainStateReader`]
//! builds the registry-specific checks on top of it.

use std::sync::Arc;

use alloy::consensus::Transaction as _;
use alloy::network::TransactionBuilder;
use alloy::primitives::{hex, Address, Bytes, LogData, B256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::address::parse_address;
use crate::error::{ChainResult, ChainStateError, RegistryError, RegistryResult};
use crate::record::{NativeTokenType, RollupRecord};

sol! {
    /// Accessors of the rollup's L1 config contract
    interface ISystemConfig {
        function unsafeBlockSigner() external view returns (address);
        function nativeTokenAddress() external view returns (address);
    }

    /// Staking registry entry point and the event it emits on success
    interface ILayer2Manager {
        function registerCandidateAddOn(address rollupConfig, uint256 amount, bool flagTon, string memo) external;

        event RegisteredCandidateAddOn(address rollupConfig, uint256 wtonAmount, string memo, address operator, address candidateAddOn);
    }
}

/// The parts of a transaction receipt the staking check reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxReceipt {
    /// Recipient of the transaction; `None` for contract creation
    pub to: Option<Address>,
    pub logs: Vec<LogData>,
}

/// Raw chain reads against one network
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Deployed bytecode at `address` (empty when nothing is deployed)
    async fn get_code(&self, address: Address) -> ChainResult<Bytes>;

    /// Execute a read-only call and return the raw return data
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;

    /// Receipt of a mined transaction
    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>>;

    /// Call data of a transaction
    async fn transaction_input(&self, hash: B256) -> ChainResult<Option<Bytes>>;
}

/// [`ChainReader`] over an alloy HTTP provider
#[derive(Clone)]
pub struct RpcChainReader {
    provider: DynProvider,
}

impl RpcChainReader {
    pub fn new(rpc_url: &str) -> RegistryResult<Self> {
        let url = rpc_url
            .parse::<Url>()
            .map_err(|e| RegistryError::InvalidRpcUrl(rpc_url.to_string(), e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider })
    }
}

fn transport_error(err: impl std::fmt::Display) -> ChainStateError {
    ChainStateError::Transport(err.to_string())
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn get_code(&self, address: Address) -> ChainResult<Bytes> {
        self.provider.get_code_at(address).await.map_err(transport_error)
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.provider.call(request).await.map_err(transport_error)
    }

    async fn transaction_receipt(&self, hash: B256) -> ChainResult<Option<TxReceipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(transport_error)?;

        Ok(receipt.map(|receipt| TxReceipt {
            to: receipt.to,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.data.clone())
                .collect(),
        }))
    }

    async fn transaction_input(&self, hash: B256) -> ChainResult<Option<Bytes>> {
        let transaction = self
            .provider
            .get_transaction_by_hash(hash)
            .await
            .map_err(transport_error)?;

        Ok(transaction.map(|tx| tx.input().clone()))
    }
}

/// Registry checks against live chain state
#[derive(Clone, Default)]
pub struct ChainStateReader {
    reader: Option<Arc<dyn ChainReader>>,
}

impl ChainStateReader {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self {
            reader: Some(reader),
        }
    }

    /// A reader with no endpoint; every check that needs the chain fails
    /// with [`ChainStateError::RpcUnavailable`]
    pub fn unconfigured() -> Self {
        Self::default()
    }

    fn reader(&self) -> ChainResult<&dyn ChainReader> {
        self.reader.as_deref().ok_or(ChainStateError::RpcUnavailable)
    }

    /// Require bytecode at `address`
    pub async fn contract_exists(&self, address: Address) -> ChainResult<()> {
        let reader = self.reader()?;
        let code = reader
            .get_code(address)
            .await
            .map_err(|e| ChainStateError::ExistenceCheckFailed(e.to_string()))?;

        if code.is_empty() {
            return Err(ChainStateError::NoContractDeployed(address));
        }
        Ok(())
    }

    /// Current sequencer designated by a config contract. Read failures are
    /// logged and reported as `None`.
    pub async fn read_sequencer_address(&self, config_address: Address) -> Option<Address> {
        let reader = self.reader.as_deref()?;
        let data = Bytes::from(ISystemConfig::unsafeBlockSignerCall {}.abi_encode());

        let result = reader
            .call(config_address, data)
            .await
            .and_then(|raw| decode_address_return(&raw));

        match result {
            Ok(sequencer) => Some(sequencer),
            Err(e) => {
                warn!(config = %config_address, error = %e, "failed to read sequencer from config contract");
                None
            }
        }
    }

    /// Require the record's declared sequencer to be the one its config
    /// contract currently designates, returning the on-chain address
    pub async fn validate_on_chain_sequencer(&self, record: &RollupRecord) -> ChainResult<Address> {
        let config_address = required_config_address(record)?;
        self.contract_exists(config_address).await?;

        let on_chain = self
            .read_sequencer_address(config_address)
            .await
            .ok_or(ChainStateError::SequencerUnreadable)?;

        let declared = parse_address(&record.sequencer.address)
            .ok_or_else(|| ChainStateError::InvalidAddress(record.sequencer.address.clone()))?;

        if on_chain != declared {
            return Err(ChainStateError::SequencerMismatch { on_chain, declared });
        }

        debug!(sequencer = %on_chain, "on-chain sequencer matches record");
        Ok(on_chain)
    }

    /// Require an ERC20 native token's declared L1 address to match the
    /// config contract's `nativeTokenAddress()`
    pub async fn validate_native_token_address(&self, record: &RollupRecord) -> ChainResult<()> {
        if record.native_token.token_type == NativeTokenType::Eth {
            return Ok(());
        }
        // A missing or malformed l1Address is reported by the declaration checks
        let Some(declared) = record.native_token.l1_address.as_deref().and_then(parse_address) else {
            return Ok(());
        };

        let reader = self.reader()?;
        let config_address = required_config_address(record)?;
        let data = Bytes::from(ISystemConfig::nativeTokenAddressCall {}.abi_encode());

        let on_chain = reader
            .call(config_address, data)
            .await
            .and_then(|raw| decode_address_return(&raw))
            .map_err(|e| ChainStateError::NativeTokenUnreadable(e.to_string()))?;

        if on_chain != declared {
            return Err(ChainStateError::NativeTokenMismatch { on_chain, declared });
        }
        Ok(())
    }

    /// Verify a declared staking candidacy against its registration
    /// transaction on the staking registry at `registry`
    pub async fn validate_staking_registration(
        &self,
        record: &RollupRecord,
        registry: Address,
    ) -> ChainResult<()> {
        let staking = &record.staking;
        if !staking.is_candidate {
            return Ok(());
        }

        let (Some(tx_hash), Some(candidate)) = (
            staking.registration_tx_hash.as_deref(),
            staking.candidate_address.as_deref(),
        ) else {
            return Err(ChainStateError::CandidacyIncomplete);
        };

        let reader = self.reader()?;
        let config_address = required_config_address(record)?;
        let tx_hash: B256 = tx_hash
            .parse()
            .map_err(|_| ChainStateError::InvalidTxHash(tx_hash.to_string()))?;
        let candidate = parse_address(candidate)
            .ok_or_else(|| ChainStateError::InvalidAddress(candidate.to_string()))?;

        let receipt = reader
            .transaction_receipt(tx_hash)
            .await?
            .ok_or(ChainStateError::TxNotFound(tx_hash))?;

        if receipt.to != Some(registry) {
            return Err(ChainStateError::WrongRecipient {
                expected: registry,
                actual: receipt
                    .to
                    .map(|to| to.to_string())
                    .unwrap_or_else(|| "contract creation".to_string()),
            });
        }

        let input = reader
            .transaction_input(tx_hash)
            .await?
            .ok_or(ChainStateError::TxNotFound(tx_hash))?;

        let call = decode_registration_call(&input)?;
        if call.rollupConfig != config_address {
            return Err(ChainStateError::ParamMismatch {
                param: call.rollupConfig,
                config: config_address,
            });
        }

        let event = receipt
            .logs
            .iter()
            .find_map(decode_registration_event)
            .ok_or(ChainStateError::EventNotFound)?;

        if event.candidateAddOn != candidate {
            return Err(ChainStateError::CandidateMismatch {
                declared: candidate,
                event: event.candidateAddOn,
            });
        }

        if event.rollupConfig != config_address {
            return Err(ChainStateError::EventConfigMismatch {
                event: event.rollupConfig,
                config: config_address,
            });
        }

        debug!(tx = %tx_hash, candidate = %candidate, "staking registration verified");
        Ok(())
    }
}

fn required_config_address(record: &RollupRecord) -> ChainResult<Address> {
    let raw = record.config_address().unwrap_or_default();
    parse_address(raw).ok_or_else(|| ChainStateError::InvalidAddress(raw.to_string()))
}

fn decode_address_return(raw: &[u8]) -> ChainResult<Address> {
    Address::abi_decode(raw).map_err(|e| ChainStateError::Transport(format!("could not decode address: {}", e)))
}

/// Decode call data as `registerCandidateAddOn`, rejecting any other function
pub(crate) fn decode_registration_call(
    input: &[u8],
) -> ChainResult<ILayer2Manager::registerCandidateAddOnCall> {
    let selector = input
        .get(..4)
        .ok_or_else(|| ChainStateError::UnexpectedCall("empty call data".to_string()))?;

    if selector != ILayer2Manager::registerCandidateAddOnCall::SELECTOR.as_slice() {
        return Err(ChainStateError::UnexpectedCall(format!(
            "selector 0x{}",
            hex::encode(selector)
        )));
    }

    ILayer2Manager::registerCandidateAddOnCall::abi_decode(input).map_err(|e| {
        ChainStateError::UnexpectedCall(format!("undecodable registerCandidateAddOn arguments ({})", e))
    })
}

fn decode_registration_event(log: &LogData) -> Option<ILayer2Manager::RegisteredCandidateAddOn> {
    if log.topics().first() != Some(&ILayer2Manager::RegisteredCandidateAddOn::SIGNATURE_HASH) {
        return None;
    }
    ILayer2Manager::RegisteredCandidateAddOn::decode_log_data(log).ok()
}
