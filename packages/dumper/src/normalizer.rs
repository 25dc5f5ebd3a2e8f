//! Normalization of beacon API light client updates into the canonical format.

use std::{fmt, str::FromStr};

use alloy_primitives::B256;
use ethereum_apis::beacon_api::response::{Response, Version};
use ethereum_merkle::ExecutionBlockProof;
use ethereum_types::consensus::{
    canonical::{
        AttestedBeaconHeader, CanonicalLightClientUpdate, FinalizedHeaderUpdate, HeaderUpdate,
        SyncCommitteeUpdate, SyncCommitteeUpdateField,
    },
    fork::ForkName,
    light_client_header::{BeaconBlockHeader, BeaconLightClientHeader, ExecutionLightClientHeader},
    light_client_update::{LightClientUpdate, RawLightClientUpdate},
    spec::Spec,
    sync_committee::SyncCommittee,
};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::DumpError,
    retry::{retry, RetryPolicy},
    sources::BeaconDataSource,
};

/// How a missing next sync committee is written in the canonical format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncCommitteeSentinel {
    /// The `sync_committee_update` key is omitted
    #[default]
    Omit,
    /// The `sync_committee_update` key is `null`
    Null,
}

impl SyncCommitteeSentinel {
    const fn absent_field(self) -> SyncCommitteeUpdateField {
        match self {
            Self::Omit => SyncCommitteeUpdateField::Absent,
            Self::Null => SyncCommitteeUpdateField::Empty,
        }
    }
}

impl fmt::Display for SyncCommitteeSentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Omit => f.write_str("omit"),
            Self::Null => f.write_str("null"),
        }
    }
}

impl FromStr for SyncCommitteeSentinel {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "omit" => Ok(Self::Omit),
            "null" => Ok(Self::Null),
            s => Err(DumpError::InvalidConfig(format!(
                "unknown sync committee sentinel `{s}`, expected `omit` or `null`"
            ))),
        }
    }
}

/// A light client update in either format.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum LightClientUpdateDocument {
    /// Already in the canonical format
    Canonical(CanonicalLightClientUpdate),
    /// As served by the beacon API
    Raw(RawLightClientUpdate),
}

impl LightClientUpdateDocument {
    /// Decodes the `data` of a light client update of `fork`. Data that carries a
    /// `finality_update` is taken to be canonical already.
    ///
    /// # Errors
    /// Returns [`DumpError::Schema`] if the data has neither shape.
    pub fn from_versioned(fork: ForkName, data: Value) -> Result<Self, DumpError> {
        if data.get("finality_update").is_some() {
            return serde_json::from_value(data)
                .map(Self::Canonical)
                .map_err(|e| DumpError::schema(format!("{fork} canonical update"), e));
        }

        let attested_slot = data
            .pointer("/attested_header/beacon/slot")
            .and_then(Value::as_str)
            .map_or_else(|| "unknown".to_string(), ToString::to_string);
        RawLightClientUpdate::from_versioned(fork, data)
            .map(Self::Raw)
            .map_err(|e| {
                DumpError::schema(format!("{fork} update attested at slot {attested_slot}"), e)
            })
    }
}

impl TryFrom<Response<Value, Version>> for LightClientUpdateDocument {
    type Error = DumpError;

    fn try_from(response: Response<Value, Version>) -> Result<Self, Self::Error> {
        Self::from_versioned(response.extra.version, response.data)
    }
}

/// Turns light client updates into the canonical format, proving the finalized execution block
/// hash against the finalized beacon block body root.
#[derive(Debug)]
pub struct Normalizer<'a, B: ?Sized> {
    beacon: &'a B,
    sentinel: SyncCommitteeSentinel,
    policy: RetryPolicy,
    spec: Option<Spec>,
}

impl<'a, B: BeaconDataSource + ?Sized> Normalizer<'a, B> {
    /// Creates a normalizer fetching block bodies from `beacon` with `policy`.
    pub const fn new(beacon: &'a B, sentinel: SyncCommitteeSentinel, policy: RetryPolicy) -> Self {
        Self {
            beacon,
            sentinel,
            policy,
            spec: None,
        }
    }

    /// Locates finalized headers in forks with `spec`.
    #[must_use]
    pub const fn with_spec(mut self, spec: Option<Spec>) -> Self {
        self.spec = spec;
        self
    }

    /// Normalizes `document`. Canonical documents are returned unchanged.
    ///
    /// Post-Capella updates are proven from their own execution header and branch, hashed in the
    /// shape of the fork of the finalized slot. Pre-Capella
    /// updates, and post-Capella updates whose finalized header predates Capella, are proven
    /// from the finalized block body fetched from the beacon source. The proof is verified
    /// against the finalized body root in both cases.
    ///
    /// # Errors
    /// Returns [`DumpError::Schema`] or [`DumpError::Decode`] naming the finalized slot if the
    /// update is malformed or inconsistent, and the source's error if the body can not be
    /// fetched.
    pub async fn normalize(
        &self,
        document: LightClientUpdateDocument,
    ) -> Result<CanonicalLightClientUpdate, DumpError> {
        match document {
            LightClientUpdateDocument::Canonical(update) => Ok(update),
            LightClientUpdateDocument::Raw(RawLightClientUpdate::PostCapella { fork, update }) => {
                self.normalize_post_capella(fork, update).await
            }
            LightClientUpdateDocument::Raw(RawLightClientUpdate::PreCapella { fork, update }) => {
                self.normalize_pre_capella(fork, update).await
            }
        }
    }

    async fn normalize_post_capella(
        &self,
        fork: ForkName,
        update: LightClientUpdate<ExecutionLightClientHeader>,
    ) -> Result<CanonicalLightClientUpdate, DumpError> {
        let LightClientUpdate {
            attested_header,
            next_sync_committee,
            next_sync_committee_branch,
            finalized_header,
            finality_branch,
            sync_aggregate,
            signature_slot,
        } = update;

        let finalized = finalized_header
            .ok_or_else(|| missing_finalized_header(fork, &attested_header.beacon))?;
        let subject = slot_subject(finalized.beacon.slot);

        // a header finalized before Capella carries an empty execution header and branch
        let proof = if finalized.execution_branch.iter().all(B256::is_zero) {
            self.prove_from_body(&finalized.beacon, &subject).await?
        } else {
            self.prove_from_light_client_header(fork, &finalized, &subject)?
        };

        Ok(CanonicalLightClientUpdate {
            attested_beacon_header: AttestedBeaconHeader {
                block_hash: Some(attested_header.execution.block_hash),
                execution_branch: Some(attested_header.execution_branch.to_vec()),
                beacon: attested_header.beacon,
            },
            sync_aggregate,
            signature_slot,
            finality_update: finality_update(finalized.beacon, proof, finality_branch),
            sync_committee_update: self.sync_committee_update(
                next_sync_committee,
                next_sync_committee_branch,
                &subject,
            )?,
        })
    }

    async fn normalize_pre_capella(
        &self,
        fork: ForkName,
        update: LightClientUpdate<BeaconLightClientHeader>,
    ) -> Result<CanonicalLightClientUpdate, DumpError> {
        let LightClientUpdate {
            attested_header,
            next_sync_committee,
            next_sync_committee_branch,
            finalized_header,
            finality_branch,
            sync_aggregate,
            signature_slot,
        } = update;

        let finalized = finalized_header
            .ok_or_else(|| missing_finalized_header(fork, &attested_header.beacon))?
            .beacon;
        let subject = slot_subject(finalized.slot);
        let proof = self.prove_from_body(&finalized, &subject).await?;

        Ok(CanonicalLightClientUpdate {
            attested_beacon_header: AttestedBeaconHeader {
                beacon: attested_header.beacon,
                block_hash: None,
                execution_branch: None,
            },
            sync_aggregate,
            signature_slot,
            finality_update: finality_update(finalized, proof, finality_branch),
            sync_committee_update: self.sync_committee_update(
                next_sync_committee,
                next_sync_committee_branch,
                &subject,
            )?,
        })
    }

    /// Proves the execution block hash of a finalized header of an update of `fork`.
    ///
    /// The execution header keeps the shape of the fork its slot belongs to, which may precede
    /// `fork` when the update straddles a fork. That fork comes from the fork schedule if known.
    /// Otherwise the shape of `fork` is tried first, then the Capella shape.
    fn prove_from_light_client_header(
        &self,
        fork: ForkName,
        finalized: &ExecutionLightClientHeader,
        subject: &str,
    ) -> Result<ExecutionBlockProof, DumpError> {
        let scheduled = self
            .spec
            .and_then(|spec| spec.fork_at_slot(finalized.beacon.slot))
            .filter(|scheduled| {
                scheduled.has_light_client_execution_header() && *scheduled <= fork
            });

        // forks with the same header shape need only be tried once
        let mut shapes: Vec<ForkName> = Vec::with_capacity(2);
        for candidate in scheduled.into_iter().chain([fork, ForkName::Capella]) {
            if shapes
                .iter()
                .all(|shape| shape.has_blob_gas() != candidate.has_blob_gas())
            {
                shapes.push(candidate);
            }
        }

        let mut first_error = None;
        for shape in shapes {
            let proven = ExecutionBlockProof::from_light_client_header(
                shape,
                &finalized.execution,
                &finalized.execution_branch,
            )
            .map_err(|e| DumpError::from_merkle(subject, &e))
            .and_then(|proof| verify(shape, &proof, &finalized.beacon, subject).map(|()| proof));
            match proven {
                Ok(proof) => {
                    if shape != fork {
                        debug!(%fork, %shape, subject, "finalized header of an earlier fork");
                    }
                    return Ok(proof);
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error
            .unwrap_or_else(|| DumpError::decode(subject, "no execution header shape to prove")))
    }

    /// Proves the execution block hash of `header` from its block body.
    async fn prove_from_body(
        &self,
        header: &BeaconBlockHeader,
        subject: &str,
    ) -> Result<ExecutionBlockProof, DumpError> {
        let slot = header.slot;
        let body = retry(self.policy, "beacon block body", subject, |_| {
            self.beacon.beacon_block_body(slot)
        })
        .await?;
        debug!(slot, fork = %body.fork, "fetched finalized block body");

        // the body's own fork decides the schema, the update may be from a later fork
        let (proof, body_root) =
            ExecutionBlockProof::from_block_body_with_root(body.fork, &body.body)
                .map_err(|e| DumpError::from_merkle(subject, &e))?;
        if body_root != header.body_root {
            return Err(DumpError::decode(
                subject,
                format!(
                    "block body root {body_root} does not match header body root {}",
                    header.body_root
                ),
            ));
        }
        verify(body.fork, &proof, header, subject)?;
        Ok(proof)
    }

    fn sync_committee_update(
        &self,
        next_sync_committee: Option<SyncCommittee>,
        next_sync_committee_branch: Option<Vec<B256>>,
        subject: &str,
    ) -> Result<SyncCommitteeUpdateField, DumpError> {
        match (next_sync_committee, next_sync_committee_branch) {
            (Some(next_sync_committee), Some(next_sync_committee_branch)) => {
                Ok(SyncCommitteeUpdateField::Present(SyncCommitteeUpdate {
                    next_sync_committee,
                    next_sync_committee_branch,
                }))
            }
            (Some(_), None) => Err(DumpError::schema(
                subject,
                "next_sync_committee without next_sync_committee_branch",
            )),
            (None, _) => Ok(self.sentinel.absent_field()),
        }
    }
}

fn finality_update(
    beacon_header: BeaconBlockHeader,
    proof: ExecutionBlockProof,
    finality_branch: Vec<B256>,
) -> FinalizedHeaderUpdate {
    FinalizedHeaderUpdate {
        header_update: HeaderUpdate {
            beacon_header,
            execution_block_hash: proof.block_hash,
            execution_hash_branch: proof.proof,
        },
        finality_branch,
    }
}

fn verify(
    fork: ForkName,
    proof: &ExecutionBlockProof,
    header: &BeaconBlockHeader,
    subject: &str,
) -> Result<(), DumpError> {
    proof
        .verify(fork, header.body_root)
        .map_err(|e| DumpError::decode(subject, e))
}

fn missing_finalized_header(fork: ForkName, attested: &BeaconBlockHeader) -> DumpError {
    DumpError::schema(
        format!("{fork} update attested at slot {}", attested.slot),
        "missing finalized_header",
    )
}

fn slot_subject(slot: u64) -> String {
    format!("slot {slot}")
}
