//! The canonical light client update format consumed by the relayer and the verifier contract.
//!
//! Beacon API updates differ per fork. The canonical format flattens them into one shape and
//! binds the finalized execution block hash to the finalized beacon block body root with an
//! inclusion proof (`execution_hash_branch`).

use alloy_primitives::B256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DisplayFromStr};

use super::{
    light_client_header::BeaconBlockHeader,
    sync_committee::{SyncAggregate, SyncCommittee},
};

/// A light client update in the canonical format.
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct CanonicalLightClientUpdate {
    /// The attested beacon header
    pub attested_beacon_header: AttestedBeaconHeader,
    /// Sync committee aggregate signature
    pub sync_aggregate: SyncAggregate,
    /// Slot at which the aggregate signature was created (untrusted)
    #[serde_as(as = "DisplayFromStr")]
    pub signature_slot: u64,
    /// The finalized header and the proofs tying it to the attested state
    pub finality_update: FinalizedHeaderUpdate,
    /// The next sync committee, see [`SyncCommitteeUpdateField`]
    #[serde(default, skip_serializing_if = "SyncCommitteeUpdateField::is_absent")]
    pub sync_committee_update: SyncCommitteeUpdateField,
}

/// The attested beacon header, with the execution data of post-Capella headers when available.
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct AttestedBeaconHeader {
    /// The beacon block header
    #[serde(flatten)]
    pub beacon: BeaconBlockHeader,
    /// Execution block hash of the attested header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
    /// Branch of the execution payload within the attested body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_branch: Option<Vec<B256>>,
}

/// The finalized header update
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct FinalizedHeaderUpdate {
    /// The finalized header with its execution block proof
    pub header_update: HeaderUpdate,
    /// Branch of the finalized header within the attested state
    pub finality_branch: Vec<B256>,
}

/// A beacon header together with the proof of its execution block hash
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct HeaderUpdate {
    /// The beacon block header
    pub beacon_header: BeaconBlockHeader,
    /// The hash of the execution block of `beacon_header`
    pub execution_block_hash: B256,
    /// Proof of `execution_block_hash` against `beacon_header.body_root`, leaf sibling first
    pub execution_hash_branch: Vec<B256>,
}

/// The next sync committee and its branch
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SyncCommitteeUpdate {
    /// The next sync committee
    pub next_sync_committee: SyncCommittee,
    /// Branch of the next sync committee within the attested state
    pub next_sync_committee_branch: Vec<B256>,
}

/// The `sync_committee_update` field, which downstream consumers distinguish in three states.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub enum SyncCommitteeUpdateField {
    /// The key is omitted
    #[default]
    Absent,
    /// The key is present with a `null` value
    Empty,
    /// The key is present with the update
    Present(SyncCommitteeUpdate),
}

impl SyncCommitteeUpdateField {
    /// Whether the key should be omitted.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The update, if present.
    #[must_use]
    pub const fn as_update(&self) -> Option<&SyncCommitteeUpdate> {
        match self {
            Self::Present(update) => Some(update),
            Self::Absent | Self::Empty => None,
        }
    }
}

impl Serialize for SyncCommitteeUpdateField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Empty => serializer.serialize_none(),
            Self::Present(update) => serializer.serialize_some(update),
        }
    }
}

impl<'de> Deserialize<'de> for SyncCommitteeUpdateField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<SyncCommitteeUpdate>::deserialize(deserializer)?
            .map_or(Self::Empty, Self::Present))
    }
}
