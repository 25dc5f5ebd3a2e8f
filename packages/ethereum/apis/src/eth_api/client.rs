//! This module implements the `EthApiClient` to interact with the Ethereum RPC API.

use alloy_primitives::{B256, U64};
use alloy_rpc_client::{RpcClient, Waiter};
use ethereum_utils::hex::{parse_quantity, to_quantity};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::EthClientError;

const RPC_METHOD_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const RPC_METHOD_GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
const RPC_METHOD_CHAIN_ID: &str = "eth_chainId";

/// The api client for interacting with the execution JSON-RPC API
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct EthApiClient {
    client: RpcClient,
    url: Url,
}

impl EthApiClient {
    /// Create new `EthApiClient` talking http to `url`
    #[must_use]
    pub fn new_http(url: Url) -> Self {
        Self {
            client: RpcClient::new_http(url.clone()),
            url,
        }
    }

    /// The endpoint of the client
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches the chain id, used to probe that the endpoint is reachable.
    /// # Errors
    /// Returns an error if the request fails
    pub async fn chain_id(&self) -> Result<u64, EthClientError> {
        let chain_id: U64 = self.client.request_noparams(RPC_METHOD_CHAIN_ID).await?;
        Ok(chain_id.to())
    }

    /// Fetches the block with full transactions, as returned by the node.
    /// # Errors
    /// Returns an error if the request fails or the node does not know the block
    #[tracing::instrument(skip(self))]
    pub async fn block_by_number(&self, number: u64) -> Result<Value, EthClientError> {
        let block: Option<Value> = self
            .client
            .request(RPC_METHOD_GET_BLOCK_BY_NUMBER, (to_quantity(number), true))
            .await?;
        block.ok_or_else(|| EthClientError::BlockNotFound(number.to_string()))
    }

    /// Fetches the blocks with full transactions in one JSON-RPC batch. Blocks unknown to the
    /// node are `None`, in request order.
    /// # Errors
    /// Returns an error if the batch request fails
    #[tracing::instrument(skip_all, fields(first = ?numbers.first(), len = numbers.len()))]
    pub async fn blocks_by_number(
        &self,
        numbers: &[u64],
    ) -> Result<Vec<Option<Value>>, EthClientError> {
        let mut batch = self.client.new_batch();
        let waiters = numbers
            .iter()
            .map(|number| {
                batch.add_call(
                    RPC_METHOD_GET_BLOCK_BY_NUMBER,
                    &(to_quantity(*number), true),
                )
            })
            .collect::<Result<Vec<Waiter<Option<Value>>>, _>>()?;

        debug!(url = %self.url, "sending batch");
        batch.send().await?;

        let mut blocks = Vec::with_capacity(waiters.len());
        for waiter in waiters {
            blocks.push(waiter.await?);
        }
        Ok(blocks)
    }

    /// Fetches the number of the block with the given hash.
    /// # Errors
    /// Returns an error if the request fails or the node does not know the block
    #[tracing::instrument(skip(self))]
    pub async fn block_number_by_hash(&self, hash: B256) -> Result<u64, EthClientError> {
        let block: Option<Value> = self
            .client
            .request(RPC_METHOD_GET_BLOCK_BY_HASH, (hash, false))
            .await?;
        let block = block.ok_or_else(|| EthClientError::BlockNotFound(hash.to_string()))?;
        block_number(&block)
    }
}

/// Reads the `number` of a block returned by the node.
/// # Errors
/// Returns an error if the block has no valid `number`
pub fn block_number(block: &Value) -> Result<u64, EthClientError> {
    let number = block
        .get("number")
        .and_then(Value::as_str)
        .ok_or_else(|| EthClientError::ParseError("block without number".to_string()))?;
    parse_quantity(number).map_err(|e| EthClientError::ParseError(e.to_string()))
}
