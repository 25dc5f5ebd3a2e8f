//! Beacon block body and execution payload schemas per fork, with the mainnet preset.
//!
//! [See in consensus-spec](https://github.com/ethereum/consensus-specs/tree/dev/specs)

use ethereum_types::consensus::fork::ForkName;

use crate::{
    error::MerkleError,
    schema::{bytes32, list, vector, Container, SszType},
};

const MAX_PROPOSER_SLASHINGS: usize = 16;
const MAX_ATTESTER_SLASHINGS: usize = 2;
const MAX_ATTESTER_SLASHINGS_ELECTRA: usize = 1;
const MAX_ATTESTATIONS: usize = 128;
const MAX_ATTESTATIONS_ELECTRA: usize = 8;
const MAX_DEPOSITS: usize = 16;
const MAX_VOLUNTARY_EXITS: usize = 16;
const MAX_BLS_TO_EXECUTION_CHANGES: usize = 16;
const MAX_BLOB_COMMITMENTS_PER_BLOCK: usize = 4096;
const MAX_VALIDATORS_PER_COMMITTEE: usize = 2048;
const MAX_COMMITTEES_PER_SLOT: usize = 64;
const DEPOSIT_CONTRACT_TREE_DEPTH: usize = 32;
const SYNC_COMMITTEE_SIZE: usize = 512;

const MAX_BYTES_PER_TRANSACTION: usize = 1_073_741_824;
const MAX_TRANSACTIONS_PER_PAYLOAD: usize = 1_048_576;
const MAX_EXTRA_DATA_BYTES: usize = 32;
const MAX_WITHDRAWALS_PER_PAYLOAD: usize = 16;
const MAX_DEPOSIT_REQUESTS_PER_PAYLOAD: usize = 8192;
const MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD: usize = 16;
const MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD: usize = 2;

const BLS_PUBKEY: SszType = SszType::ByteVector(48);
const BLS_SIGNATURE: SszType = SszType::ByteVector(96);
const ADDRESS: SszType = SszType::ByteVector(20);

/// The `BeaconBlockBody` of `fork`.
#[must_use]
pub fn beacon_block_body(fork: ForkName) -> Container {
    let electra = fork >= ForkName::Electra;
    let (max_attester_slashings, max_attestations) = if electra {
        (MAX_ATTESTER_SLASHINGS_ELECTRA, MAX_ATTESTATIONS_ELECTRA)
    } else {
        (MAX_ATTESTER_SLASHINGS, MAX_ATTESTATIONS)
    };

    let mut fields = vec![
        ("randao_reveal", BLS_SIGNATURE),
        ("eth1_data", eth1_data()),
        ("graffiti", bytes32()),
        (
            "proposer_slashings",
            list(proposer_slashing(), MAX_PROPOSER_SLASHINGS),
        ),
        (
            "attester_slashings",
            list(attester_slashing(electra), max_attester_slashings),
        ),
        ("attestations", list(attestation(electra), max_attestations)),
        ("deposits", list(deposit(), MAX_DEPOSITS)),
        (
            "voluntary_exits",
            list(signed_voluntary_exit(), MAX_VOLUNTARY_EXITS),
        ),
    ];
    if fork >= ForkName::Altair {
        fields.push(("sync_aggregate", sync_aggregate()));
    }
    if fork.has_execution_payload() {
        fields.push(("execution_payload", execution_payload_container(fork).into()));
    }
    if fork >= ForkName::Capella {
        fields.push((
            "bls_to_execution_changes",
            list(signed_bls_to_execution_change(), MAX_BLS_TO_EXECUTION_CHANGES),
        ));
    }
    if fork >= ForkName::Deneb {
        fields.push((
            "blob_kzg_commitments",
            list(SszType::ByteVector(48), MAX_BLOB_COMMITMENTS_PER_BLOCK),
        ));
    }
    if electra {
        fields.push(("execution_requests", execution_requests()));
    }

    Container::new("BeaconBlockBody", fields)
}

/// The `ExecutionPayload` of `fork`.
///
/// # Errors
/// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
pub fn execution_payload(fork: ForkName) -> Result<Container, MerkleError> {
    if fork.has_execution_payload() {
        Ok(execution_payload_container(fork))
    } else {
        Err(MerkleError::NoExecutionPayload(fork))
    }
}

/// The `ExecutionPayloadHeader` of `fork`. Same tree shape as the payload, with the lists
/// replaced by their roots.
///
/// # Errors
/// Returns [`MerkleError::NoExecutionPayload`] before Bellatrix.
pub fn execution_payload_header(fork: ForkName) -> Result<Container, MerkleError> {
    if !fork.has_execution_payload() {
        return Err(MerkleError::NoExecutionPayload(fork));
    }

    let mut fields = execution_payload_prefix();
    fields.push(("transactions_root", bytes32()));
    if fork >= ForkName::Capella {
        fields.push(("withdrawals_root", bytes32()));
    }
    if fork.has_blob_gas() {
        fields.push(("blob_gas_used", SszType::Uint64));
        fields.push(("excess_blob_gas", SszType::Uint64));
    }

    Ok(Container::new("ExecutionPayloadHeader", fields))
}

fn execution_payload_container(fork: ForkName) -> Container {
    let mut fields = execution_payload_prefix();
    fields.push((
        "transactions",
        list(
            SszType::ByteList(MAX_BYTES_PER_TRANSACTION),
            MAX_TRANSACTIONS_PER_PAYLOAD,
        ),
    ));
    if fork >= ForkName::Capella {
        fields.push(("withdrawals", list(withdrawal(), MAX_WITHDRAWALS_PER_PAYLOAD)));
    }
    if fork.has_blob_gas() {
        fields.push(("blob_gas_used", SszType::Uint64));
        fields.push(("excess_blob_gas", SszType::Uint64));
    }

    Container::new("ExecutionPayload", fields)
}

fn execution_payload_prefix() -> Vec<(&'static str, SszType)> {
    vec![
        ("parent_hash", bytes32()),
        ("fee_recipient", ADDRESS),
        ("state_root", bytes32()),
        ("receipts_root", bytes32()),
        ("logs_bloom", SszType::ByteVector(256)),
        ("prev_randao", bytes32()),
        ("block_number", SszType::Uint64),
        ("gas_limit", SszType::Uint64),
        ("gas_used", SszType::Uint64),
        ("timestamp", SszType::Uint64),
        ("extra_data", SszType::ByteList(MAX_EXTRA_DATA_BYTES)),
        ("base_fee_per_gas", SszType::Uint256),
        ("block_hash", bytes32()),
    ]
}

/// The `BeaconBlockHeader`.
#[must_use]
pub fn beacon_block_header() -> Container {
    Container::new(
        "BeaconBlockHeader",
        vec![
            ("slot", SszType::Uint64),
            ("proposer_index", SszType::Uint64),
            ("parent_root", bytes32()),
            ("state_root", bytes32()),
            ("body_root", bytes32()),
        ],
    )
}

fn eth1_data() -> SszType {
    Container::new(
        "Eth1Data",
        vec![
            ("deposit_root", bytes32()),
            ("deposit_count", SszType::Uint64),
            ("block_hash", bytes32()),
        ],
    )
    .into()
}

fn signed_beacon_block_header() -> SszType {
    Container::new(
        "SignedBeaconBlockHeader",
        vec![
            ("message", beacon_block_header().into()),
            ("signature", BLS_SIGNATURE),
        ],
    )
    .into()
}

fn proposer_slashing() -> SszType {
    Container::new(
        "ProposerSlashing",
        vec![
            ("signed_header_1", signed_beacon_block_header()),
            ("signed_header_2", signed_beacon_block_header()),
        ],
    )
    .into()
}

fn checkpoint() -> SszType {
    Container::new(
        "Checkpoint",
        vec![("epoch", SszType::Uint64), ("root", bytes32())],
    )
    .into()
}

fn attestation_data() -> SszType {
    Container::new(
        "AttestationData",
        vec![
            ("slot", SszType::Uint64),
            ("index", SszType::Uint64),
            ("beacon_block_root", bytes32()),
            ("source", checkpoint()),
            ("target", checkpoint()),
        ],
    )
    .into()
}

const fn max_attesting_indices(electra: bool) -> usize {
    if electra {
        MAX_VALIDATORS_PER_COMMITTEE * MAX_COMMITTEES_PER_SLOT
    } else {
        MAX_VALIDATORS_PER_COMMITTEE
    }
}

fn indexed_attestation(electra: bool) -> SszType {
    Container::new(
        "IndexedAttestation",
        vec![
            (
                "attesting_indices",
                list(SszType::Uint64, max_attesting_indices(electra)),
            ),
            ("data", attestation_data()),
            ("signature", BLS_SIGNATURE),
        ],
    )
    .into()
}

fn attester_slashing(electra: bool) -> SszType {
    Container::new(
        "AttesterSlashing",
        vec![
            ("attestation_1", indexed_attestation(electra)),
            ("attestation_2", indexed_attestation(electra)),
        ],
    )
    .into()
}

fn attestation(electra: bool) -> SszType {
    let mut fields = vec![
        (
            "aggregation_bits",
            SszType::Bitlist(max_attesting_indices(electra)),
        ),
        ("data", attestation_data()),
        ("signature", BLS_SIGNATURE),
    ];
    if electra {
        fields.push(("committee_bits", SszType::Bitvector(MAX_COMMITTEES_PER_SLOT)));
    }
    Container::new("Attestation", fields).into()
}

fn deposit() -> SszType {
    let deposit_data = Container::new(
        "DepositData",
        vec![
            ("pubkey", BLS_PUBKEY),
            ("withdrawal_credentials", bytes32()),
            ("amount", SszType::Uint64),
            ("signature", BLS_SIGNATURE),
        ],
    );
    Container::new(
        "Deposit",
        vec![
            ("proof", vector(bytes32(), DEPOSIT_CONTRACT_TREE_DEPTH + 1)),
            ("data", deposit_data.into()),
        ],
    )
    .into()
}

fn signed_voluntary_exit() -> SszType {
    let voluntary_exit = Container::new(
        "VoluntaryExit",
        vec![
            ("epoch", SszType::Uint64),
            ("validator_index", SszType::Uint64),
        ],
    );
    Container::new(
        "SignedVoluntaryExit",
        vec![
            ("message", voluntary_exit.into()),
            ("signature", BLS_SIGNATURE),
        ],
    )
    .into()
}

fn sync_aggregate() -> SszType {
    Container::new(
        "SyncAggregate",
        vec![
            (
                "sync_committee_bits",
                SszType::Bitvector(SYNC_COMMITTEE_SIZE),
            ),
            ("sync_committee_signature", BLS_SIGNATURE),
        ],
    )
    .into()
}

fn signed_bls_to_execution_change() -> SszType {
    let change = Container::new(
        "BLSToExecutionChange",
        vec![
            ("validator_index", SszType::Uint64),
            ("from_bls_pubkey", BLS_PUBKEY),
            ("to_execution_address", ADDRESS),
        ],
    );
    Container::new(
        "SignedBLSToExecutionChange",
        vec![("message", change.into()), ("signature", BLS_SIGNATURE)],
    )
    .into()
}

fn withdrawal() -> SszType {
    Container::new(
        "Withdrawal",
        vec![
            ("index", SszType::Uint64),
            ("validator_index", SszType::Uint64),
            ("address", ADDRESS),
            ("amount", SszType::Uint64),
        ],
    )
    .into()
}

fn execution_requests() -> SszType {
    let deposit_request = Container::new(
        "DepositRequest",
        vec![
            ("pubkey", BLS_PUBKEY),
            ("withdrawal_credentials", bytes32()),
            ("amount", SszType::Uint64),
            ("signature", BLS_SIGNATURE),
            ("index", SszType::Uint64),
        ],
    );
    let withdrawal_request = Container::new(
        "WithdrawalRequest",
        vec![
            ("source_address", ADDRESS),
            ("validator_pubkey", BLS_PUBKEY),
            ("amount", SszType::Uint64),
        ],
    );
    let consolidation_request = Container::new(
        "ConsolidationRequest",
        vec![
            ("source_address", ADDRESS),
            ("source_pubkey", BLS_PUBKEY),
            ("target_pubkey", BLS_PUBKEY),
        ],
    );
    Container::new(
        "ExecutionRequests",
        vec![
            (
                "deposits",
                list(deposit_request.into(), MAX_DEPOSIT_REQUESTS_PER_PAYLOAD),
            ),
            (
                "withdrawals",
                list(
                    withdrawal_request.into(),
                    MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD,
                ),
            ),
            (
                "consolidations",
                list(
                    consolidation_request.into(),
                    MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD,
                ),
            ),
        ],
    )
    .into()
}
