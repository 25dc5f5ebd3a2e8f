//! The data sources of the dumper, implemented by the network clients and by test doubles.

use alloy_primitives::B256;
use async_trait::async_trait;
use ethereum_apis::{
    beacon_api::{
        client::BeaconApiClient,
        response::{BlockId, Response, Version},
    },
    eth_api::client::EthApiClient,
};
use ethereum_types::consensus::{
    beacon_block::VersionedBeaconBlockBody, light_client_header::BeaconBlockHeader, spec::Spec,
};
use serde_json::Value;

use crate::error::DumpError;

/// A source of raw execution blocks, e.g. an execution JSON-RPC endpoint.
#[async_trait]
pub trait ExecutionBlockSource: Send + Sync {
    /// Fetches the blocks with full transactions in one request. Blocks unknown to the source
    /// are `None`, in request order.
    async fn blocks(&self, numbers: &[u64]) -> Result<Vec<Option<Value>>, DumpError>;

    /// Fetches one block with full transactions.
    async fn block(&self, number: u64) -> Result<Value, DumpError>;

    /// Resolves a block hash to its number.
    async fn block_number_by_hash(&self, hash: B256) -> Result<u64, DumpError>;
}

/// A source of beacon chain data, e.g. a beacon API endpoint.
#[async_trait]
pub trait BeaconDataSource: Send + Sync {
    /// Fetches the fork schedule of the chain.
    async fn spec(&self) -> Result<Spec, DumpError>;

    /// Fetches the beacon block header of `block_id`.
    async fn beacon_header(&self, block_id: BlockId) -> Result<BeaconBlockHeader, DumpError>;

    /// Fetches the body of the beacon block at `slot`, tagged with its fork.
    async fn beacon_block_body(&self, slot: u64) -> Result<VersionedBeaconBlockBody, DumpError>;

    /// Fetches `count` light client updates starting at `start_period`, tagged with their fork.
    async fn light_client_updates(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Vec<Response<Value, Version>>, DumpError>;

    /// Fetches `count` light client updates starting at `start_period`, verbatim.
    async fn light_client_updates_raw(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Value, DumpError>;
}

#[async_trait]
impl ExecutionBlockSource for EthApiClient {
    async fn blocks(&self, numbers: &[u64]) -> Result<Vec<Option<Value>>, DumpError> {
        Ok(self.blocks_by_number(numbers).await?)
    }

    async fn block(&self, number: u64) -> Result<Value, DumpError> {
        Ok(self.block_by_number(number).await?)
    }

    async fn block_number_by_hash(&self, hash: B256) -> Result<u64, DumpError> {
        Ok(Self::block_number_by_hash(self, hash).await?)
    }
}

#[async_trait]
impl BeaconDataSource for BeaconApiClient {
    async fn spec(&self) -> Result<Spec, DumpError> {
        Ok(Self::spec(self).await?)
    }

    async fn beacon_header(&self, block_id: BlockId) -> Result<BeaconBlockHeader, DumpError> {
        Ok(Self::beacon_header(self, block_id).await?)
    }

    async fn beacon_block_body(&self, slot: u64) -> Result<VersionedBeaconBlockBody, DumpError> {
        Ok(Self::beacon_block_body(self, slot).await?)
    }

    async fn light_client_updates(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Vec<Response<Value, Version>>, DumpError> {
        Ok(Self::light_client_updates(self, start_period, count).await?)
    }

    async fn light_client_updates_raw(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Value, DumpError> {
        Ok(Self::light_client_updates_raw(self, start_period, count).await?)
    }
}
