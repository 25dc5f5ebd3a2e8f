//! This module defines constants related to merkle trees in the Ethereum consensus.

// https://github.com/ethereum/consensus-specs/blob/dev/specs/capella/light-client/sync-protocol.md#constants
/// `get_generalized_index(BeaconBlockBody, 'execution_payload')` (= 25)
pub const EXECUTION_PAYLOAD_GINDEX: u64 = 25;

/// `get_generalized_index(ExecutionPayload, 'block_hash')` for Bellatrix and Capella (= 28)
pub const BLOCK_HASH_GINDEX_BELLATRIX: u64 = 28;
/// `get_generalized_index(ExecutionPayload, 'block_hash')` from Deneb on (= 44)
pub const BLOCK_HASH_GINDEX_DENEB: u64 = 44;

/// Convenience function safely to call [`u64::ilog2`] and convert the result into a usize.
#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
#[must_use]
pub const fn floorlog2(n: u64) -> usize {
    // conversion is safe since usize is either 32 or 64 bits as per cfg above
    n.ilog2() as usize
}

/// Depth of the `execution_branch` of a light client header.
pub const EXECUTION_BRANCH_DEPTH: usize = floorlog2(EXECUTION_PAYLOAD_GINDEX);
