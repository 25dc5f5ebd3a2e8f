//! This module defines types related to beacon's block and header api endpoints.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{bls::BlsSignature, fork::ForkName, light_client_header::BeaconBlockHeader};

/// A beacon block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconBlock {
    /// The beacon block message
    pub message: BeaconBlockMessage,
    /// The beacon block signature
    pub signature: BlsSignature,
}

/// A beacon block message
///
/// The body is kept as the JSON served by the beacon API, since its shape depends on the fork
/// and it is only ever merkleized against a schema.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconBlockMessage {
    /// The beacon block slot
    #[serde_as(as = "DisplayFromStr")]
    pub slot: u64,
    /// The beacon block proposer index
    #[serde_as(as = "DisplayFromStr")]
    pub proposer_index: u64,
    /// The beacon block parent root
    pub parent_root: B256,
    /// The beacon block state root
    pub state_root: B256,
    /// The beacon block body
    pub body: serde_json::Value,
}

/// A beacon block body together with the fork it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedBeaconBlockBody {
    /// The fork of the block
    pub fork: ForkName,
    /// The slot of the block
    pub slot: u64,
    /// The beacon block body
    pub body: serde_json::Value,
}

/// A signed beacon block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlockHeader {
    /// The beacon block header
    pub message: BeaconBlockHeader,
    /// The signature of the header
    pub signature: BlsSignature,
}

/// The `data` of the beacon headers endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconHeaderSummary {
    /// The beacon block root
    pub root: B256,
    /// Whether the block is part of the canonical chain
    pub canonical: bool,
    /// The signed header
    pub header: SignedBeaconBlockHeader,
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_header_summary() {
        let summary: BeaconHeaderSummary = serde_json::from_value(json!({
            "root": format!("0x{}", "01".repeat(32)),
            "canonical": true,
            "header": {
                "message": {
                    "slot": "8192",
                    "proposer_index": "7",
                    "parent_root": format!("0x{}", "02".repeat(32)),
                    "state_root": format!("0x{}", "03".repeat(32)),
                    "body_root": format!("0x{}", "04".repeat(32)),
                },
                "signature": format!("0x{}", "05".repeat(96)),
            }
        }))
        .unwrap();
        assert!(summary.canonical);
        assert_eq!(8192, summary.header.message.slot);
    }

    #[test]
    fn test_block_body_is_kept_verbatim() {
        let body = json!({ "graffiti": format!("0x{}", "00".repeat(32)), "unknown": [1, 2] });
        let block: BeaconBlock = serde_json::from_value(json!({
            "message": {
                "slot": "1",
                "proposer_index": "2",
                "parent_root": format!("0x{}", "02".repeat(32)),
                "state_root": format!("0x{}", "03".repeat(32)),
                "body": body.clone(),
            },
            "signature": format!("0x{}", "05".repeat(96)),
        }))
        .unwrap();
        assert_eq!(body, block.message.body);
    }
}
