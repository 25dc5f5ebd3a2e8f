//! Proof of the execution block hash against the beacon block body root.

use alloy_primitives::B256;
use ethereum_types::consensus::{
    fork::ForkName,
    light_client_header::ExecutionPayloadHeader,
    merkle::{floorlog2, EXECUTION_BRANCH_DEPTH},
};
use ethereum_utils::ensure;
use serde_json::Value;

use crate::{
    error::MerkleError,
    forks::{beacon_block_body, execution_payload, execution_payload_header},
    gindex::{concat_generalized_indices, generalized_index, GeneralizedIndex},
    hash::{container_field_roots_with, hash_tree_root},
    proof::{merkle_proof, verify_merkle_proof, ContainerTree, MerkleProof},
    schema::SszType,
};

/// The execution block hash of a beacon block and its proof against the block's body root.
///
/// The proof is the proof of `block_hash` within the execution payload followed by the proof
/// of the execution payload within the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionBlockProof {
    /// The execution block hash
    pub block_hash: B256,
    /// Proof of `block_hash` against the body root, leaf sibling first
    pub proof: MerkleProof,
}

impl ExecutionBlockProof {
    /// Generalized index of `execution_payload` within the body of `fork` (25 for every fork
    /// with an execution payload).
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
    pub fn execution_payload_gindex(fork: ForkName) -> Result<GeneralizedIndex, MerkleError> {
        ensure!(
            fork.has_execution_payload(),
            MerkleError::NoExecutionPayload(fork)
        );
        generalized_index(&beacon_block_body(fork), &["execution_payload"])
    }

    /// Generalized index of `block_hash` within the execution payload of `fork`.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
    pub fn block_hash_gindex(fork: ForkName) -> Result<GeneralizedIndex, MerkleError> {
        generalized_index(&execution_payload(fork)?, &["block_hash"])
    }

    /// Generalized index of the execution block hash within the body of `fork`.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
    pub fn gindex(fork: ForkName) -> Result<GeneralizedIndex, MerkleError> {
        Ok(concat_generalized_indices(
            Self::execution_payload_gindex(fork)?,
            Self::block_hash_gindex(fork)?,
        ))
    }

    /// Length of the proof for `fork`: 8 for Bellatrix and Capella, 9 from Deneb on.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
    pub fn depth(fork: ForkName) -> Result<usize, MerkleError> {
        Ok(floorlog2(Self::gindex(fork)?))
    }

    /// Builds the proof from a beacon block body as served by the beacon API.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix and [`MerkleError::Decode`]
    /// if the body does not match the schema of `fork`.
    pub fn from_block_body(fork: ForkName, body: &Value) -> Result<Self, MerkleError> {
        Self::from_block_body_with_root(fork, body).map(|(proof, _)| proof)
    }

    /// Same as [`Self::from_block_body`], also returning the body root. The execution payload and
    /// the body are each hashed once.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix and [`MerkleError::Decode`]
    /// if the body does not match the schema of `fork`.
    pub fn from_block_body_with_root(
        fork: ForkName,
        body: &Value,
    ) -> Result<(Self, B256), MerkleError> {
        let payload_schema = execution_payload(fork)?;
        let payload = body
            .get("execution_payload")
            .ok_or_else(|| MerkleError::decode("execution_payload", "missing field"))?;
        let payload_tree = ContainerTree::at_path(&payload_schema, payload, "execution_payload")?;

        let body_schema = beacon_block_body(fork);
        let body_tree = ContainerTree::from_field_roots(
            &body_schema,
            container_field_roots_with(
                &body_schema,
                body,
                "",
                &[("execution_payload", payload_tree.root())],
            )?,
        );

        let mut proof = payload_tree.proof(Self::block_hash_gindex(fork)?)?;
        proof.extend(body_tree.proof(Self::execution_payload_gindex(fork)?)?);

        Ok((
            Self {
                block_hash: decode_block_hash(payload, "execution_payload.block_hash")?,
                proof,
            },
            body_tree.root(),
        ))
    }

    /// Builds the proof from the execution header and branch of a light client header.
    ///
    /// # Errors
    /// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix and
    /// [`MerkleError::InvalidProofLength`] if the branch is not as deep as `execution_payload`.
    pub fn from_light_client_header(
        fork: ForkName,
        execution: &ExecutionPayloadHeader,
        execution_branch: &[B256],
    ) -> Result<Self, MerkleError> {
        ensure!(
            execution_branch.len() == EXECUTION_BRANCH_DEPTH,
            MerkleError::InvalidProofLength {
                gindex: Self::execution_payload_gindex(fork)?,
                expected: EXECUTION_BRANCH_DEPTH,
                found: execution_branch.len(),
            }
        );

        let header = serde_json::to_value(execution)
            .map_err(|e| MerkleError::decode("execution", e))?;
        let mut proof = merkle_proof(
            &execution_payload_header(fork)?,
            &header,
            Self::block_hash_gindex(fork)?,
        )?;
        proof.extend_from_slice(execution_branch);

        Ok(Self {
            block_hash: execution.block_hash,
            proof,
        })
    }

    /// Verifies the proof against the body root of a beacon block of `fork`.
    ///
    /// # Errors
    /// Returns an error if the proof is not valid.
    pub fn verify(&self, fork: ForkName, body_root: B256) -> Result<(), MerkleError> {
        verify_merkle_proof(self.block_hash, &self.proof, Self::gindex(fork)?, body_root)
    }
}

/// The `hash_tree_root` of a beacon block body, i.e. the `body_root` of its header.
///
/// # Errors
/// Returns [`MerkleError::Decode`] if the body does not match the schema of `fork`.
pub fn beacon_block_body_root(fork: ForkName, body: &Value) -> Result<B256, MerkleError> {
    hash_tree_root(&SszType::Container(beacon_block_body(fork)), body)
}

/// Derives the execution payload header of an execution payload, replacing the lists by their
/// roots.
///
/// # Errors
/// Returns [`MerkleError::Decode`] if the payload does not match the schema of `fork`.
pub fn execution_payload_to_header(fork: ForkName, payload: &Value) -> Result<Value, MerkleError> {
    let payload_schema = execution_payload(fork)?;
    let mut header = serde_json::Map::new();
    for (name, ty) in &payload_schema.fields {
        let value = payload
            .get(*name)
            .ok_or_else(|| MerkleError::decode(name, "missing field"))?;
        match *name {
            "transactions" | "withdrawals" => {
                let root = hash_tree_root(ty, value)?;
                header.insert(format!("{name}_root"), Value::String(root.to_string()));
            }
            _ => {
                header.insert((*name).to_string(), value.clone());
            }
        }
    }
    Ok(Value::Object(header))
}

fn decode_block_hash(payload: &Value, path: &str) -> Result<B256, MerkleError> {
    payload
        .get("block_hash")
        .cloned()
        .ok_or_else(|| MerkleError::decode(path, "missing field"))
        .and_then(|value| serde_json::from_value(value).map_err(|e| MerkleError::decode(path, e)))
}
