//! This module implements the `BeaconApiClient` to interact with the Ethereum Beacon API.

use ethereum_types::consensus::{
    beacon_block::{BeaconBlock, BeaconHeaderSummary, VersionedBeaconBlockBody},
    light_client_header::BeaconBlockHeader,
    spec::Spec,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    error::{BeaconApiClientError, InternalServerError, NotFoundError},
    response::{BlockId, Response, Version},
};

const SPEC_PATH: &str = "/eth/v1/config/spec";
const BEACON_HEADERS_PATH: &str = "/eth/v1/beacon/headers";
const BEACON_BLOCKS_V2_PATH: &str = "/eth/v2/beacon/blocks";
const LIGHT_CLIENT_UPDATES_PATH: &str = "/eth/v1/beacon/light_client/updates";

/// The api client for interacting with the Beacon API
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct BeaconApiClient {
    client: Client,
    base_url: String,
}

impl BeaconApiClient {
    /// Create new `BeaconApiClient`
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create new `BeaconApiClient` on top of an existing http client
    #[must_use]
    pub fn with_client(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The base url of the Beacon API
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the Beacon spec
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn spec(&self) -> Result<Spec, BeaconApiClientError> {
        let resp: Response<Spec> = self.get_json(SPEC_PATH).await?;
        Ok(resp.data)
    }

    /// Fetches the header summary (root, canonical flag and signed header) for a given block id
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn header_summary(
        &self,
        block_id: BlockId,
    ) -> Result<BeaconHeaderSummary, BeaconApiClientError> {
        let resp: Response<BeaconHeaderSummary> = self
            .get_json(&format!("{BEACON_HEADERS_PATH}/{block_id}"))
            .await?;
        Ok(resp.data)
    }

    /// Fetches the beacon block header for a given block id
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn beacon_header(
        &self,
        block_id: BlockId,
    ) -> Result<BeaconBlockHeader, BeaconApiClientError> {
        Ok(self.header_summary(block_id).await?.header.message)
    }

    /// Fetches the Beacon block for a given block id, with the fork it belongs to
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn beacon_block(
        &self,
        block_id: BlockId,
    ) -> Result<Response<BeaconBlock, Version>, BeaconApiClientError> {
        self.get_json(&format!("{BEACON_BLOCKS_V2_PATH}/{block_id}"))
            .await
    }

    /// Fetches the body of the Beacon block at `slot`
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn beacon_block_body(
        &self,
        slot: u64,
    ) -> Result<VersionedBeaconBlockBody, BeaconApiClientError> {
        let resp = self.beacon_block(BlockId::Slot(slot)).await?;
        Ok(VersionedBeaconBlockBody {
            fork: resp.extra.version,
            slot: resp.data.message.slot,
            body: resp.data.message.body,
        })
    }

    /// Fetches Beacon light client updates starting from a given period, each tagged with the
    /// fork it was produced in
    /// # Errors
    /// Returns an error if the request fails or the response is not successful deserialized
    pub async fn light_client_updates(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Vec<Response<serde_json::Value, Version>>, BeaconApiClientError> {
        self.get_json(&light_client_updates_path(start_period, count))
            .await
    }

    /// Fetches Beacon light client updates starting from a given period, verbatim
    /// # Errors
    /// Returns an error if the request fails or the response is not valid JSON
    pub async fn light_client_updates_raw(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<serde_json::Value, BeaconApiClientError> {
        self.get_json(&light_client_updates_path(start_period, count))
            .await
    }

    // Helper functions
    #[tracing::instrument(skip_all)]
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BeaconApiClientError> {
        let url = format!("{}{}", self.base_url, path);

        debug!(%url, "get_json");

        let res = self.client.get(url).send().await?;

        match res.status() {
            StatusCode::OK => {
                let bytes = res.bytes().await?;

                debug!(response = %String::from_utf8_lossy(&bytes), "get_json");

                Ok(serde_json::from_slice(&bytes).map_err(BeaconApiClientError::Json)?)
            }
            StatusCode::NOT_FOUND => Err(BeaconApiClientError::NotFound(
                res.json::<NotFoundError>().await?,
            )),
            StatusCode::INTERNAL_SERVER_ERROR => Err(BeaconApiClientError::Internal(
                res.json::<InternalServerError>().await?,
            )),
            code => Err(BeaconApiClientError::Other {
                code,
                text: res.text().await?,
            }),
        }
    }
}

fn light_client_updates_path(start_period: u64, count: u64) -> String {
    format!("{LIGHT_CLIENT_UPDATES_PATH}?start_period={start_period}&count={count}")
}
