//! In-memory data sources recording the requests they serve.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Mutex,
};

use alloy_primitives::B256;
use async_trait::async_trait;
use ethereum_apis::beacon_api::response::{BlockId, Response, Version};
use ethereum_merkle::{
    execution_proof::{beacon_block_body_root, execution_payload_to_header},
    forks::beacon_block_body,
    ExecutionBlockProof,
};
use ethereum_types::consensus::{
    beacon_block::VersionedBeaconBlockBody, fork::ForkName,
    light_client_header::BeaconBlockHeader, merkle::EXECUTION_BRANCH_DEPTH, spec::Spec,
};
use ethereum_utils::{hex::to_quantity, slot::SLOTS_PER_SYNC_COMMITTEE_PERIOD};
use serde_json::{json, Value};

use crate::{
    error::DumpError,
    sources::{BeaconDataSource, ExecutionBlockSource},
};

/// Serves a block for every number, except the configured gaps.
#[derive(Debug, Default)]
pub struct MockExecutionSource {
    missing_in_batch: BTreeSet<u64>,
    unavailable: BTreeSet<u64>,
    numbers_by_hash: HashMap<B256, u64>,
    batch_calls: Mutex<Vec<Vec<u64>>>,
    item_calls: Mutex<Vec<u64>>,
}

impl MockExecutionSource {
    /// Blocks that batch responses leave out.
    pub fn with_missing_in_batch(mut self, numbers: impl IntoIterator<Item = u64>) -> Self {
        self.missing_in_batch.extend(numbers);
        self
    }

    /// Blocks that can not be fetched at all.
    pub fn with_unavailable(mut self, numbers: impl IntoIterator<Item = u64>) -> Self {
        self.unavailable.extend(numbers);
        self
    }

    pub fn with_block_hash(mut self, hash: B256, number: u64) -> Self {
        self.numbers_by_hash.insert(hash, number);
        self
    }

    pub fn batch_calls(&self) -> Vec<Vec<u64>> {
        self.batch_calls.lock().unwrap().clone()
    }

    pub fn item_calls(&self) -> Vec<u64> {
        self.item_calls.lock().unwrap().clone()
    }

    pub fn raw_block(number: u64) -> Value {
        json!({
            "number": to_quantity(number),
            "hash": block_hash(number),
            "parentHash": block_hash(number.saturating_sub(1)),
            "gasLimit": "0x1c9c380",
            "baseFeePerGas": "0x7",
            "transactions": [],
        })
    }
}

#[async_trait]
impl ExecutionBlockSource for MockExecutionSource {
    async fn blocks(&self, numbers: &[u64]) -> Result<Vec<Option<Value>>, DumpError> {
        self.batch_calls.lock().unwrap().push(numbers.to_vec());
        Ok(numbers
            .iter()
            .map(|number| {
                (!self.missing_in_batch.contains(number) && !self.unavailable.contains(number))
                    .then(|| Self::raw_block(*number))
            })
            .collect())
    }

    async fn block(&self, number: u64) -> Result<Value, DumpError> {
        self.item_calls.lock().unwrap().push(number);
        if self.unavailable.contains(&number) {
            return Err(DumpError::Transport(format!("block {number} not found")));
        }
        Ok(Self::raw_block(number))
    }

    async fn block_number_by_hash(&self, hash: B256) -> Result<u64, DumpError> {
        self.numbers_by_hash
            .get(&hash)
            .copied()
            .ok_or_else(|| DumpError::Transport(format!("block {hash} not found")))
    }
}

/// Serves a fixed finalized header, block bodies and light client updates per period.
#[derive(Debug, Default)]
pub struct MockBeaconSource {
    pub finalized: BeaconBlockHeader,
    pub bodies: HashMap<u64, VersionedBeaconBlockBody>,
    pub updates: BTreeMap<u64, Response<Value, Version>>,
    /// Periods whose requests fail
    pub failing_periods: BTreeSet<u64>,
    /// Served fork schedule, none fails the request
    pub spec: Option<Spec>,
    pub(crate) body_calls: Mutex<Vec<u64>>,
}

impl MockBeaconSource {
    /// Serves `update` for `period` and the finalized block body it needs.
    pub fn with_update(
        mut self,
        period: u64,
        (update, body): (Response<Value, Version>, VersionedBeaconBlockBody),
    ) -> Self {
        self.updates.insert(period, update);
        self.bodies.insert(body.slot, body);
        self
    }

    pub fn body_calls(&self) -> Vec<u64> {
        self.body_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BeaconDataSource for MockBeaconSource {
    async fn spec(&self) -> Result<Spec, DumpError> {
        self.spec.ok_or_else(|| DumpError::Transport("no spec".to_string()))
    }

    async fn beacon_header(&self, block_id: BlockId) -> Result<BeaconBlockHeader, DumpError> {
        match block_id {
            BlockId::Finalized | BlockId::Head => Ok(self.finalized.clone()),
            BlockId::Slot(slot) if slot == self.finalized.slot => Ok(self.finalized.clone()),
            BlockId::Slot(slot) => Err(DumpError::Transport(format!("no header at slot {slot}"))),
        }
    }

    async fn beacon_block_body(&self, slot: u64) -> Result<VersionedBeaconBlockBody, DumpError> {
        self.body_calls.lock().unwrap().push(slot);
        self.bodies
            .get(&slot)
            .cloned()
            .ok_or_else(|| DumpError::Transport(format!("no block at slot {slot}")))
    }

    async fn light_client_updates(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Vec<Response<Value, Version>>, DumpError> {
        let periods = start_period..start_period.saturating_add(count);
        if let Some(period) = self.failing_periods.iter().find(|p| periods.contains(*p)) {
            return Err(DumpError::Transport(format!(
                "500 no update for period {period}"
            )));
        }
        Ok(self.updates.range(periods).map(|(_, update)| update.clone()).collect())
    }

    async fn light_client_updates_raw(
        &self,
        start_period: u64,
        count: u64,
    ) -> Result<Value, DumpError> {
        Ok(serde_json::to_value(
            self.light_client_updates(start_period, count).await?,
        )?)
    }
}

/// The hash of the mocked execution block `number`.
pub fn block_hash(number: u64) -> B256 {
    B256::left_padding_from(&number.to_be_bytes())
}

/// A beacon block body of `fork` whose execution payload is block `block_number`.
pub fn block_body(fork: ForkName, block_number: u64) -> Value {
    let mut body = beacon_block_body(fork).default_value();
    if fork.has_execution_payload() {
        let payload = &mut body["execution_payload"];
        payload["block_hash"] = json!(block_hash(block_number));
        payload["block_number"] = json!(block_number.to_string());
        payload["base_fee_per_gas"] = json!("7");
        payload["transactions"] = json!(["0x02f8"]);
    }
    body["graffiti"] = json!(format!("0x{}", "42".repeat(32)));
    body
}

/// The light client header of a block at `slot` whose execution payload is block
/// `block_number`, together with the body it commits to.
pub fn light_client_header(fork: ForkName, slot: u64, block_number: u64) -> (Value, Value) {
    let body = block_body(fork, block_number);
    let beacon = json!({
        "slot": slot.to_string(),
        "proposer_index": "7",
        "parent_root": B256::repeat_byte(0x01),
        "state_root": B256::repeat_byte(0x02),
        "body_root": beacon_block_body_root(fork, &body).unwrap(),
    });

    let header = if fork.has_light_client_execution_header() {
        let proof = ExecutionBlockProof::from_block_body(fork, &body).unwrap();
        let depth = proof.proof.len();
        json!({
            "beacon": beacon,
            "execution": execution_payload_to_header(fork, &body["execution_payload"]).unwrap(),
            "execution_branch": proof.proof[depth - EXECUTION_BRANCH_DEPTH..].to_vec(),
        })
    } else {
        json!({ "beacon": beacon })
    };
    (header, body)
}

/// A light client update of `period` whose finalized execution block is `block_number`, and
/// the body of its finalized block.
pub fn light_client_update(
    fork: ForkName,
    period: u64,
    block_number: u64,
) -> (Response<Value, Version>, VersionedBeaconBlockBody) {
    let finalized_slot = period * SLOTS_PER_SYNC_COMMITTEE_PERIOD + 64;
    let (finalized_header, body) = light_client_header(fork, finalized_slot, block_number);
    let (attested_header, _) = light_client_header(fork, finalized_slot + 64, block_number + 64);

    let data = json!({
        "attested_header": attested_header,
        "next_sync_committee": {
            "pubkeys": [format!("0x{}", "a1".repeat(48)), format!("0x{}", "a2".repeat(48))],
            "aggregate_pubkey": format!("0x{}", "a3".repeat(48)),
        },
        "next_sync_committee_branch": vec![B256::repeat_byte(0x05); 5],
        "finalized_header": finalized_header,
        "finality_branch": vec![B256::repeat_byte(0x06); 6],
        "sync_aggregate": {
            "sync_committee_bits": "0xffff",
            "sync_committee_signature": format!("0x{}", "b1".repeat(96)),
        },
        "signature_slot": (finalized_slot + 65).to_string(),
    });

    (
        Response {
            data,
            extra: Version { version: fork },
        },
        VersionedBeaconBlockBody {
            fork,
            slot: finalized_slot,
            body,
        },
    )
}
