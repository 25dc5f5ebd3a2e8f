//! Merkle proof generation over containers and verification.

use alloy_primitives::B256;
use ethereum_types::consensus::merkle::floorlog2;
use ethereum_utils::ensure;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{
    error::{InvalidMerkleBranch, MerkleError},
    gindex::{get_subtree_index, GeneralizedIndex},
    hash::{child_path, container_field_roots},
    schema::Container,
};

/// Sibling hashes from the leaf up to the root, leaf sibling first
pub type MerkleProof = Vec<B256>;

/// Builds the proof of the node at `gindex` within the tree of `container` as `value`.
///
/// `gindex` may address a field, an intermediate node, or a node within a nested container.
///
/// # Errors
/// Returns [`MerkleError::Schema`] if `gindex` addresses no node of the container, and
/// [`MerkleError::Decode`] if `value` does not match the container.
pub fn merkle_proof(
    container: &Container,
    value: &Value,
    gindex: GeneralizedIndex,
) -> Result<MerkleProof, MerkleError> {
    prove(container, value, gindex, "")
}

fn prove(
    container: &Container,
    value: &Value,
    gindex: GeneralizedIndex,
    path: &str,
) -> Result<MerkleProof, MerkleError> {
    if gindex == 0 {
        return Err(MerkleError::Schema("generalized index 0".to_string()));
    }

    let depth = container.depth();
    let node_depth = floorlog2(gindex);
    if node_depth <= depth {
        return ContainerTree::at_path(container, value, path)?.proof(gindex);
    }

    // the node lies below one of the fields: prove it in the field, then the field in here
    let below = node_depth - depth;
    let field_gindex = gindex >> below;
    let field_index = usize::try_from(get_subtree_index(field_gindex))
        .map_err(|e| MerkleError::Schema(e.to_string()))?;
    let (name, ty) = container.fields.get(field_index).ok_or_else(|| {
        MerkleError::Schema(format!(
            "generalized index {gindex} is below padding of `{}`",
            container.name
        ))
    })?;
    let field_container = ty.as_container().ok_or_else(|| {
        MerkleError::Schema(format!(
            "generalized index {gindex} is below `{}.{name}`, which is not a container",
            container.name
        ))
    })?;
    let field_path = child_path(path, name);
    let field_value = value
        .get(*name)
        .ok_or_else(|| MerkleError::decode(&field_path, "missing field"))?;

    let inner_gindex = (gindex & ((1 << below) - 1)) | (1 << below);
    let mut proof = prove(field_container, field_value, inner_gindex, &field_path)?;
    proof.extend(prove(container, value, field_gindex, path)?);
    Ok(proof)
}

/// The tree over the field roots of a container. Any node of it can be proven without hashing
/// the value again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerTree {
    /// Leaves first, root last
    layers: Vec<Vec<B256>>,
}

impl ContainerTree {
    /// Hashes `value` as a `container`.
    ///
    /// # Errors
    /// Returns [`MerkleError::Decode`] if `value` does not match the container.
    pub fn new(container: &Container, value: &Value) -> Result<Self, MerkleError> {
        Self::at_path(container, value, "")
    }

    pub(crate) fn at_path(
        container: &Container,
        value: &Value,
        path: &str,
    ) -> Result<Self, MerkleError> {
        Ok(Self::from_field_roots(
            container,
            container_field_roots(container, value, path)?,
        ))
    }

    /// Builds the tree from the roots of the fields of `container`, in field order.
    #[must_use]
    pub fn from_field_roots(container: &Container, roots: Vec<B256>) -> Self {
        Self {
            layers: tree_layers(roots, container.depth()),
        }
    }

    /// The `hash_tree_root` of the container.
    #[must_use]
    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    /// Proves the node at `gindex`, which must lie within this tree (not below a field).
    ///
    /// # Errors
    /// Returns [`MerkleError::Schema`] if `gindex` addresses no node of this tree.
    pub fn proof(&self, gindex: GeneralizedIndex) -> Result<MerkleProof, MerkleError> {
        let depth = self.layers.len().saturating_sub(1);
        ensure!(
            gindex != 0 && floorlog2(gindex) <= depth,
            MerkleError::Schema(format!(
                "generalized index {gindex} is not a node of a tree of depth {depth}"
            ))
        );
        Ok(layer_siblings(&self.layers, gindex))
    }
}

/// Layers of the tree over `leaves` padded to `2^depth`, leaves first and root last.
fn tree_layers(mut leaves: Vec<B256>, depth: usize) -> Vec<Vec<B256>> {
    leaves.resize(1 << depth, B256::ZERO);
    let mut layers = vec![leaves];
    while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
        let parents = layer
            .chunks_exact(2)
            .map(|pair| hash_pair(pair[0], pair[1]))
            .collect();
        layers.push(parents);
    }
    layers
}

fn layer_siblings(layers: &[Vec<B256>], gindex: GeneralizedIndex) -> MerkleProof {
    let node_depth = floorlog2(gindex);
    let tree_depth = layers.len() - 1;
    let mut position = get_subtree_index(gindex);
    (tree_depth - node_depth..tree_depth)
        .map(|layer| {
            #[allow(clippy::cast_possible_truncation)]
            let sibling = layers[layer][(position ^ 1) as usize];
            position >>= 1;
            sibling
        })
        .collect()
}

fn hash_pair(left: B256, right: B256) -> B256 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    B256::from_slice(&hasher.finalize()[..])
}

/// Verifies that `leaf` is the node at `gindex` of the tree with the given `root`.
///
/// # Errors
/// Returns [`MerkleError::InvalidProofLength`] if the proof length is not `floor(log2(gindex))`
/// and [`MerkleError::InvalidMerkleBranch`] if the computed root does not match.
pub fn verify_merkle_proof(
    leaf: B256,
    proof: &[B256],
    gindex: GeneralizedIndex,
    root: B256,
) -> Result<(), MerkleError> {
    ensure!(
        gindex != 0,
        MerkleError::Schema("generalized index 0".to_string())
    );
    let depth = floorlog2(gindex);
    ensure!(
        proof.len() == depth,
        MerkleError::InvalidProofLength {
            gindex,
            expected: depth,
            found: proof.len(),
        }
    );

    validate_merkle_branch(leaf, proof, depth, get_subtree_index(gindex), root)
}

// https://github.com/ethereum/consensus-specs/blob/efb554f4c4848f8bfc260fcf3ff4b806971716f6/specs/phase0/beacon-chain.md#is_valid_merkle_branch
fn validate_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: usize,
    index: u64,
    root: B256,
) -> Result<(), MerkleError> {
    let value = branch
        .iter()
        .take(depth)
        .enumerate()
        .fold(leaf, |value, (i, branch_node)| {
            if (index >> i) & 1 == 1 {
                hash_pair(*branch_node, value)
            } else {
                hash_pair(value, *branch_node)
            }
        });

    if value == root {
        Ok(())
    } else {
        Err(MerkleError::InvalidMerkleBranch(Box::new(
            InvalidMerkleBranch {
                leaf,
                branch: branch.to_vec(),
                depth,
                index,
                root,
                found: value,
            },
        )))
    }
}
