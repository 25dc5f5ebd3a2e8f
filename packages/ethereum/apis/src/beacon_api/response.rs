//! This module defines the response types for the Beacon API.

use std::fmt;

use ethereum_types::consensus::fork::ForkName;
use serde::{Deserialize, Serialize};

/// The response structure returned by the Beacon API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<Data, Extra = EmptyExtra> {
    /// The main data of the response.
    pub data: Data,
    /// Extra data of the response.
    #[serde(flatten)]
    pub extra: Extra,
}

/// The default empty extra data for `Response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyExtra {}

/// The version response structure returned by the Beacon API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// The fork the data belongs to.
    pub version: ForkName,
}

/// Identifies a beacon block in block and header endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
    /// The canonical head
    Head,
    /// The latest finalized block
    Finalized,
    /// The block at a slot
    Slot(u64),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => f.write_str("head"),
            Self::Finalized => f.write_str("finalized"),
            Self::Slot(slot) => write!(f, "{slot}"),
        }
    }
}

#[cfg(test)]
mod test {
    use ethereum_types::consensus::beacon_block::BeaconHeaderSummary;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_versioned_response() {
        let response: Vec<Response<serde_json::Value, Version>> = serde_json::from_value(json!([
            { "version": "capella", "data": { "a": 1 } },
            { "version": "deneb", "data": { "b": 2 } },
        ]))
        .unwrap();
        assert_eq!(ForkName::Capella, response[0].extra.version);
        assert_eq!(json!({ "b": 2 }), response[1].data);

        assert!(serde_json::from_value::<Response<serde_json::Value, Version>>(
            json!({ "version": "nope", "data": {} })
        )
        .is_err());
    }

    #[test]
    fn test_header_response() {
        let response: Response<BeaconHeaderSummary> = serde_json::from_value(json!({
            "execution_optimistic": false,
            "finalized": true,
            "data": {
                "root": format!("0x{}", "01".repeat(32)),
                "canonical": true,
                "header": {
                    "message": {
                        "slot": "6209536",
                        "proposer_index": "1",
                        "parent_root": format!("0x{}", "02".repeat(32)),
                        "state_root": format!("0x{}", "03".repeat(32)),
                        "body_root": format!("0x{}", "04".repeat(32)),
                    },
                    "signature": format!("0x{}", "05".repeat(96)),
                }
            }
        }))
        .unwrap();
        assert_eq!(6_209_536, response.data.header.message.slot);
    }

    #[test]
    fn test_block_id() {
        assert_eq!("head", BlockId::Head.to_string());
        assert_eq!("finalized", BlockId::Finalized.to_string());
        assert_eq!("42", BlockId::Slot(42).to_string());
    }
}
