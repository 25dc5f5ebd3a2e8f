//! This module defines errors for `EthApiClient`.

use alloy_transport::TransportError;

#[derive(Debug, thiserror::Error)]
#[allow(missing_docs, clippy::module_name_repetitions)]
pub enum EthClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("parse error: {0}")]
    ParseError(String),
}
