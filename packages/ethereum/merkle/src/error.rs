//! Errors of the merkle proof engine.

use alloy_primitives::B256;
use ethereum_types::consensus::fork::ForkName;

/// The error type of the merkle proof engine
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum MerkleError {
    /// The schema does not describe the requested node
    #[error("schema error: {0}")]
    Schema(String),

    /// A value does not match its schema
    #[error("failed to decode `{path}`: {reason}")]
    Decode {
        /// Path of the offending value, e.g. `execution_payload.block_hash`
        path: String,
        /// What went wrong
        reason: String,
    },

    /// The fork has no execution payload to prove
    #[error("{0} beacon blocks carry no execution payload")]
    NoExecutionPayload(ForkName),

    /// A proof does not have the length implied by its generalized index
    #[error("invalid proof length for generalized index {gindex}: expected {expected}, found {found}")]
    InvalidProofLength {
        /// The generalized index
        gindex: u64,
        /// `floor(log2(gindex))`
        expected: usize,
        /// Length of the given proof
        found: usize,
    },

    /// Invalid merkle branch error
    #[error(transparent)]
    InvalidMerkleBranch(#[from] Box<InvalidMerkleBranch>), // boxed to decrease enum size
}

#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
#[error("invalid merkle branch \
    (leaf: {leaf}, branch: [{branch}], \
    depth: {depth}, index: {index}, root: {root}, found: {found})",
    branch = .branch.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
)]
/// Error details for invalid Merkle branch verification
pub struct InvalidMerkleBranch {
    /// Leaf hash
    pub leaf: B256,
    /// Branch hashes
    pub branch: Vec<B256>,
    /// Tree depth
    pub depth: usize,
    /// Leaf index
    pub index: u64,
    /// Expected root hash
    pub root: B256,
    /// Computed root hash
    pub found: B256,
}

impl MerkleError {
    pub(crate) fn decode(path: &str, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error is caused by the input value rather than by the requested index.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::NoExecutionPayload(_))
    }
}
