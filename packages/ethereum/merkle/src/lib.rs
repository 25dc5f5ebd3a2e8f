//! SSZ merkleization of beacon API JSON and execution block inclusion proofs.
//!
//! Only the containers needed to prove an execution block hash against a beacon block body root
//! are described (see [`forks`]). Values are never deserialized into typed SSZ containers: the
//! schema drives hashing of the JSON directly.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod error;
pub mod execution_proof;
pub mod forks;
pub mod gindex;
pub mod hash;
pub mod proof;
pub mod schema;

pub use error::{InvalidMerkleBranch, MerkleError};
pub use execution_proof::ExecutionBlockProof;
pub use gindex::{concat_generalized_indices, generalized_index, GeneralizedIndex};
pub use hash::hash_tree_root;
pub use proof::{merkle_proof, verify_merkle_proof, ContainerTree, MerkleProof};
