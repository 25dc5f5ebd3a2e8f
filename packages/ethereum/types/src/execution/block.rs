//! Execution blocks as returned by `eth_getBlockByNumber`, normalized to a fixed shape.

use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use ethereum_utils::hex::{parse_quantity, parse_u256_quantity};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// The error returned when a raw execution block can not be normalized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ExecutionBlockError {
    /// The block is not a JSON object
    #[error("execution block is not a JSON object")]
    NotAnObject,
    /// A field has an unexpected value
    #[error("invalid execution block field `{field}`: {reason}")]
    InvalidField {
        /// The canonical name of the field
        field: &'static str,
        /// What went wrong
        reason: String,
    },
}

/// An execution block with canonical snake case keys.
///
/// Quantities serialize as `0x` hex strings. Fields missing from the source are `null`, except
/// the counters that default to `0x0`.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct NormalizedExecutionBlock {
    /// Hash of the parent block
    pub parent_hash: Option<B256>,
    /// Hash of the ommers list
    pub uncles_hash: Option<B256>,
    /// Beneficiary of the block
    pub author: Option<Address>,
    /// The state root
    pub state_root: Option<B256>,
    /// The root of the transactions trie
    pub transactions_root: Option<B256>,
    /// The root of the receipts trie
    pub receipts_root: Option<B256>,
    /// The logs bloom filter
    pub log_bloom: Option<Bloom>,
    /// Block difficulty
    pub difficulty: U256,
    /// Block number
    #[serde(with = "alloy_serde::quantity")]
    pub number: u64,
    /// Block gas limit
    #[serde(with = "alloy_serde::quantity")]
    pub gas_limit: u64,
    /// Block gas used
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    /// Block timestamp
    #[serde(with = "alloy_serde::quantity")]
    pub timestamp: u64,
    /// Extra data of the block
    pub extra_data: Option<Bytes>,
    /// Mix hash (`prevRandao` after the merge)
    pub mix_hash: Option<B256>,
    /// Block nonce
    pub nonce: Option<B64>,
    /// Base fee per gas (London)
    pub base_fee_per_gas: Option<U256>,
    /// Root of the withdrawals trie (Shanghai)
    pub withdrawals_root: Option<B256>,
    /// Blob gas used (Cancun)
    #[serde(with = "alloy_serde::quantity")]
    pub blob_gas_used: u64,
    /// Excess blob gas (Cancun)
    #[serde(with = "alloy_serde::quantity")]
    pub excess_blob_gas: u64,
    /// Root of the parent beacon block (Cancun)
    pub parent_beacon_block_root: Option<B256>,
    /// Hash of the execution requests (Prague)
    pub requests_hash: Option<B256>,
}

impl NormalizedExecutionBlock {
    /// Normalizes a block given either with the JSON-RPC `camelCase` keys or already normalized.
    /// When both spellings of a key are present the JSON-RPC one wins.
    ///
    /// # Errors
    /// Returns an error if the block is not an object or a field can not be parsed.
    pub fn from_raw(raw: &Value) -> Result<Self, ExecutionBlockError> {
        let fields = RawBlock(raw.as_object().ok_or(ExecutionBlockError::NotAnObject)?);

        Ok(Self {
            parent_hash: fields.decode("parentHash", "parent_hash")?,
            uncles_hash: fields.decode("sha3Uncles", "uncles_hash")?,
            author: fields.decode("miner", "author")?,
            state_root: fields.decode("stateRoot", "state_root")?,
            transactions_root: fields.decode("transactionsRoot", "transactions_root")?,
            receipts_root: fields.decode("receiptsRoot", "receipts_root")?,
            log_bloom: fields.decode("logsBloom", "log_bloom")?,
            difficulty: fields.u256("difficulty", "difficulty")?.unwrap_or_default(),
            number: fields.u64("number", "number")?.unwrap_or_default(),
            gas_limit: fields.u64("gasLimit", "gas_limit")?.unwrap_or_default(),
            gas_used: fields.u64("gasUsed", "gas_used")?.unwrap_or_default(),
            timestamp: fields.u64("timestamp", "timestamp")?.unwrap_or_default(),
            extra_data: fields.decode("extraData", "extra_data")?,
            mix_hash: fields.decode("mixHash", "mix_hash")?,
            nonce: fields.decode("nonce", "nonce")?,
            base_fee_per_gas: fields.u256("baseFeePerGas", "base_fee_per_gas")?,
            withdrawals_root: fields.decode("withdrawalsRoot", "withdrawals_root")?,
            blob_gas_used: fields.u64("blobGasUsed", "blob_gas_used")?.unwrap_or_default(),
            excess_blob_gas: fields.u64("excessBlobGas", "excess_blob_gas")?.unwrap_or_default(),
            parent_beacon_block_root: fields
                .decode("parentBeaconBlockRoot", "parent_beacon_block_root")?,
            requests_hash: fields.decode("requestsHash", "requests_hash")?,
        })
    }
}

struct RawBlock<'a>(&'a Map<String, Value>);

impl RawBlock<'_> {
    fn get(&self, rpc_key: &str, key: &str) -> Option<&Value> {
        [rpc_key, key]
            .into_iter()
            .find_map(|k| self.0.get(k).filter(|v| !v.is_null()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        rpc_key: &str,
        key: &'static str,
    ) -> Result<Option<T>, ExecutionBlockError> {
        self.get(rpc_key, key)
            .map(|value| {
                T::deserialize(value).map_err(|e| ExecutionBlockError::InvalidField {
                    field: key,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn u64(&self, rpc_key: &str, key: &'static str) -> Result<Option<u64>, ExecutionBlockError> {
        self.get(rpc_key, key)
            .map(|value| match value {
                Value::Number(n) => n.as_u64().ok_or_else(|| invalid_quantity(key, value)),
                Value::String(s) => parse_quantity(s).map_err(|_| invalid_quantity(key, value)),
                _ => Err(invalid_quantity(key, value)),
            })
            .transpose()
    }

    fn u256(&self, rpc_key: &str, key: &'static str) -> Result<Option<U256>, ExecutionBlockError> {
        self.get(rpc_key, key)
            .map(|value| match value {
                Value::Number(n) => n
                    .as_u64()
                    .map(U256::from)
                    .ok_or_else(|| invalid_quantity(key, value)),
                Value::String(s) => {
                    parse_u256_quantity(s).map_err(|_| invalid_quantity(key, value))
                }
                _ => Err(invalid_quantity(key, value)),
            })
            .transpose()
    }
}

fn invalid_quantity(field: &'static str, value: &Value) -> ExecutionBlockError {
    ExecutionBlockError::InvalidField {
        field,
        reason: format!("expected a quantity, got {value}"),
    }
}
