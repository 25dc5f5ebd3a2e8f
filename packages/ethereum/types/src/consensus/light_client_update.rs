//! This module defines the light client updates served by the beacon API, tagged by fork family.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{
    fork::ForkName,
    light_client_header::{BeaconBlockHeader, BeaconLightClientHeader, ExecutionLightClientHeader},
    sync_committee::{SyncAggregate, SyncCommittee},
};

/// A light client update, generic over the light client header of its fork family.
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct LightClientUpdate<H> {
    /// Header attested to by the sync committee
    pub attested_header: H,
    /// Next sync committee corresponding to `attested_header.state_root`
    #[serde(default)]
    pub next_sync_committee: Option<SyncCommittee>,
    /// The branch of the next sync committee
    #[serde(default)]
    pub next_sync_committee_branch: Option<Vec<B256>>,
    /// Finalized header corresponding to `attested_header.state_root`
    #[serde(default)]
    pub finalized_header: Option<H>,
    /// Branch of the finalized header
    #[serde(default)]
    pub finality_branch: Vec<B256>,
    /// Sync committee aggregate signature
    pub sync_aggregate: SyncAggregate,
    /// Slot at which the aggregate signature was created (untrusted)
    #[serde_as(as = "DisplayFromStr")]
    pub signature_slot: u64,
}

/// Access to the beacon block header of any light client header.
pub trait HasBeaconHeader {
    /// The beacon block header
    fn beacon(&self) -> &BeaconBlockHeader;
}

impl HasBeaconHeader for BeaconLightClientHeader {
    fn beacon(&self) -> &BeaconBlockHeader {
        &self.beacon
    }
}

impl HasBeaconHeader for ExecutionLightClientHeader {
    fn beacon(&self) -> &BeaconBlockHeader {
        &self.beacon
    }
}

impl<H: HasBeaconHeader> LightClientUpdate<H> {
    /// The slot of the finalized header, if the update has one.
    #[must_use]
    pub fn finalized_slot(&self) -> Option<u64> {
        self.finalized_header.as_ref().map(|header| header.beacon().slot)
    }

    /// The slot of the attested header.
    #[must_use]
    pub fn attested_slot(&self) -> u64 {
        self.attested_header.beacon().slot
    }
}

/// A light client update as served by the beacon API, tagged with the fork it was produced in.
#[derive(PartialEq, Eq, Clone, Debug)]
#[allow(clippy::module_name_repetitions, clippy::large_enum_variant)]
pub enum RawLightClientUpdate {
    /// Altair and Bellatrix updates, whose headers only carry the beacon header.
    PreCapella {
        /// The fork of the update
        fork: ForkName,
        /// The update
        update: LightClientUpdate<BeaconLightClientHeader>,
    },
    /// Capella and later updates, whose headers carry the execution header and branch.
    PostCapella {
        /// The fork of the update
        fork: ForkName,
        /// The update
        update: LightClientUpdate<ExecutionLightClientHeader>,
    },
}

impl RawLightClientUpdate {
    /// Decodes the `data` of a versioned beacon API response into the variant of `fork`.
    ///
    /// # Errors
    /// Returns an error if `data` does not have the shape of the fork's light client update.
    pub fn from_versioned(
        fork: ForkName,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(if fork.has_light_client_execution_header() {
            Self::PostCapella {
                fork,
                update: serde_json::from_value(data)?,
            }
        } else {
            Self::PreCapella {
                fork,
                update: serde_json::from_value(data)?,
            }
        })
    }

    /// The fork of the update.
    #[must_use]
    pub const fn fork(&self) -> ForkName {
        match self {
            Self::PreCapella { fork, .. } | Self::PostCapella { fork, .. } => *fork,
        }
    }

    /// The slot of the finalized header, if the update has one.
    #[must_use]
    pub fn finalized_slot(&self) -> Option<u64> {
        match self {
            Self::PreCapella { update, .. } => update.finalized_slot(),
            Self::PostCapella { update, .. } => update.finalized_slot(),
        }
    }

    /// The slot of the attested header.
    #[must_use]
    pub fn attested_slot(&self) -> u64 {
        match self {
            Self::PreCapella { update, .. } => update.attested_slot(),
            Self::PostCapella { update, .. } => update.attested_slot(),
        }
    }
}
