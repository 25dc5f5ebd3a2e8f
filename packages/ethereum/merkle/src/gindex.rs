//! Generalized indices.
//!
//! [See in consensus-spec](https://github.com/ethereum/consensus-specs/blob/dev/ssz/merkle-proofs.md#generalized-merkle-tree-index)

use ethereum_types::consensus::merkle::floorlog2;

use crate::{error::MerkleError, schema::Container};

/// A generalized index: the root is 1, the children of `n` are `2n` and `2n + 1`. Never 0.
pub type GeneralizedIndex = u64;

/// Composes the index of a node within a subtree with the index of that subtree.
///
/// `concat_generalized_indices(25, 44)` is the index of the execution block hash within a Deneb
/// beacon block body.
#[must_use]
pub const fn concat_generalized_indices(
    outer: GeneralizedIndex,
    inner: GeneralizedIndex,
) -> GeneralizedIndex {
    let depth = inner.ilog2();
    (outer << depth) | (inner ^ (1 << depth))
}

/// The position of the node among the nodes at its depth.
#[must_use]
pub const fn get_subtree_index(gindex: GeneralizedIndex) -> u64 {
    gindex % 2u64.pow(gindex.ilog2())
}

/// The generalized index of the node reached by descending `container` along `path`.
///
/// # Errors
/// Returns [`MerkleError::Schema`] if a field is unknown or the path descends into a field that
/// is not a container.
pub fn generalized_index(
    container: &Container,
    path: &[&str],
) -> Result<GeneralizedIndex, MerkleError> {
    let mut gindex: GeneralizedIndex = 1;
    let mut current = Some(container);

    for field in path {
        let container = current.ok_or_else(|| {
            MerkleError::Schema(format!("can not descend into `{field}`: not a container"))
        })?;
        let index = container.field_index(field).ok_or_else(|| {
            MerkleError::Schema(format!("`{}` has no field `{field}`", container.name))
        })?;
        let depth = container.depth();
        if floorlog2(gindex) + depth >= 64 {
            return Err(MerkleError::Schema(format!(
                "generalized index of `{}` overflows",
                path.join(".")
            )));
        }

        gindex = concat_generalized_indices(gindex, (1 << depth) | index as u64);
        current = container.fields[index].1.as_container();
    }

    Ok(gindex)
}
