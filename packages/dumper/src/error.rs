//! This module defines [`DumpError`].

use std::io;

use ethereum_apis::{beacon_api::error::BeaconApiClientError, eth_api::error::EthClientError};
use ethereum_merkle::MerkleError;

/// The error type of the dumper.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum DumpError {
    /// A network or node error, retried by [`crate::retry::retry`]
    #[error("transport error: {0}")]
    Transport(String),

    /// The data does not have the shape its fork prescribes
    #[error("schema error for {subject}: {message}")]
    Schema {
        /// What was being processed, e.g. `slot 8192`
        subject: String,
        /// What went wrong
        message: String,
    },

    /// The data could not be decoded or does not match what it commits to
    #[error("decode error for {subject}: {message}")]
    Decode {
        /// What was being processed, e.g. `slot 8192`
        subject: String,
        /// What went wrong
        message: String,
    },

    /// All attempts of a retried operation failed
    #[error("{operation} for {subject} failed after {attempts} attempts: {source}")]
    ExhaustedRetries {
        /// The operation, e.g. `eth_getBlockByNumber`
        operation: &'static str,
        /// What the operation was applied to, e.g. `block 100`
        subject: String,
        /// The number of attempts made
        attempts: u32,
        /// The error of the last attempt
        #[source]
        source: Box<DumpError>,
    },

    /// None of the configured endpoints answered the probe
    #[error("no reachable endpoint among {0:?}")]
    NoReachableEndpoint(Vec<String>),

    /// The configuration is invalid
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing the output failed
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serializing the output failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DumpError {
    /// Creates a [`DumpError::Schema`].
    pub fn schema(subject: impl ToString, message: impl ToString) -> Self {
        Self::Schema {
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a [`DumpError::Decode`].
    pub fn decode(subject: impl ToString, message: impl ToString) -> Self {
        Self::Decode {
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    /// Maps a proof engine error to a schema or decode error about `subject`.
    pub fn from_merkle(subject: impl ToString, err: &MerkleError) -> Self {
        if err.is_decode() {
            Self::decode(subject, err)
        } else {
            Self::schema(subject, err)
        }
    }

    /// Whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<EthClientError> for DumpError {
    fn from(err: EthClientError) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<BeaconApiClientError> for DumpError {
    fn from(err: BeaconApiClientError) -> Self {
        match err {
            BeaconApiClientError::Json(e) => Self::decode("beacon api response", e),
            e => Self::Transport(e.to_string()),
        }
    }
}
