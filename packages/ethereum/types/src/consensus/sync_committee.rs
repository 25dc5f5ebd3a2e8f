//! This module defines types related to the sync committee.

use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

use super::bls::{BlsPublicKey, BlsSignature};

/// The sync committee data
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SyncCommittee {
    /// The public keys of the sync committee
    pub pubkeys: Vec<BlsPublicKey>,
    /// The aggregate public key of the sync committee
    pub aggregate_pubkey: BlsPublicKey,
}

/// The sync committee aggregate
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SyncAggregate {
    /// The bits representing the sync committee's participation.
    pub sync_committee_bits: Bytes,
    /// The aggregated signature of the sync committee.
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    /// Returns the number of participants in the sync committee.
    #[must_use]
    pub fn num_sync_committee_participants(&self) -> usize {
        self.sync_committee_bits
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }
}
