//! The dump pipeline: finalized header, light client updates of recent periods and the
//! execution blocks between their finalized execution blocks.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use alloy_primitives::B256;
use ethereum_apis::beacon_api::response::{BlockId, Response, Version};
use ethereum_types::consensus::{light_client_header::BeaconBlockHeader, spec::Spec};
use ethereum_utils::{
    hex::parse_quantity,
    slot::{period_of, recent_periods},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    config::{DumpConfig, UpdateOutputMode},
    error::DumpError,
    fetcher::{fetch_range, FetchSummary},
    normalizer::{LightClientUpdateDocument, Normalizer},
    plan::{plan_block_ranges, surrounding_window, BlockRange},
    retry::retry,
    sink::{BlockSink, JsonArraySink},
    sources::{BeaconDataSource, ExecutionBlockSource},
};

/// The number of newest periods whose finalized execution blocks bound the dumped block ranges.
pub const PLANNED_PERIODS: usize = 3;

/// A light client update written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpedUpdate {
    /// The sync committee period
    pub period: u64,
    /// The file the update was written to
    pub path: PathBuf,
    /// The slot of the finalized beacon header, if the update has one
    pub finalized_slot: Option<u64>,
    /// The hash of the finalized execution block, if the update could be normalized
    pub execution_block_hash: Option<B256>,
}

/// What a full run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    /// The finalized beacon header
    pub header: BeaconBlockHeader,
    /// The light client updates, newest first
    pub updates: Vec<DumpedUpdate>,
    /// The execution block ranges
    pub blocks: Vec<(BlockRange, FetchSummary)>,
}

/// Dumps data from an execution source and a beacon source to the configured directory.
#[derive(Debug)]
pub struct Dumper<E, B> {
    execution: E,
    beacon: B,
    config: DumpConfig,
}

impl<E: ExecutionBlockSource, B: BeaconDataSource> Dumper<E, B> {
    /// Creates a dumper and its output directory.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the directory can not be created.
    pub fn new(execution: E, beacon: B, config: DumpConfig) -> Result<Self, DumpError> {
        config.validate()?;
        fs::create_dir_all(&config.out_dir)?;
        Ok(Self {
            execution,
            beacon,
            config,
        })
    }

    /// The configuration of the dumper.
    #[must_use]
    pub const fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Runs the whole pipeline: the finalized header, the updates of the configured number of
    /// recent periods and the block ranges planned from them.
    ///
    /// # Errors
    /// Returns the first fatal error. Periods whose update can not be dumped are skipped.
    pub async fn run_all(&self) -> Result<DumpReport, DumpError> {
        let header = self.dump_finalized_header().await?;
        let periods = recent_periods(period_of(header.slot), self.config.update_count);
        let updates = self.dump_periods(&periods).await?;

        let mut blocks = Vec::new();
        for range in self.plan(&updates).await? {
            blocks.push((range, self.dump_blocks(range).await?));
        }

        info!(
            slot = header.slot,
            updates = updates.len(),
            ranges = blocks.len(),
            "dump complete"
        );
        Ok(DumpReport {
            header,
            updates,
            blocks,
        })
    }

    /// Writes the message of the finalized beacon header to `beacon_header_{slot}.json`.
    ///
    /// # Errors
    /// Returns an error if the header can not be fetched or written.
    pub async fn dump_finalized_header(&self) -> Result<BeaconBlockHeader, DumpError> {
        let header = self.finalized_header().await?;
        let path = self.path(&format!("beacon_header_{}.json", header.slot));
        write_json(&path, &header)?;
        info!(slot = header.slot, path = %path.display(), "wrote beacon header");
        Ok(header)
    }

    /// Writes the light client updates of the `count` most recent periods, relative to the
    /// finalized header, to `light_client_update_period_{period}.json`.
    ///
    /// # Errors
    /// Returns an error if the finalized header can not be fetched or a file can not be written.
    /// Periods whose update can not be fetched or normalized are skipped.
    pub async fn dump_light_client_updates(
        &self,
        count: u64,
    ) -> Result<Vec<DumpedUpdate>, DumpError> {
        let header = self.finalized_header().await?;
        let current = period_of(header.slot);
        info!(slot = header.slot, period = current, "current sync committee period");
        self.dump_periods(&recent_periods(current, count)).await
    }

    /// Plans the block ranges between the finalized execution blocks of the newest
    /// [`PLANNED_PERIODS`] dumped updates.
    ///
    /// # Errors
    /// Returns an error if a block hash can not be resolved or the blocks are not ascending.
    pub async fn plan(&self, updates: &[DumpedUpdate]) -> Result<Vec<BlockRange>, DumpError> {
        let mut hashes = updates
            .iter()
            .filter_map(|update| Some((update.period, update.execution_block_hash?)))
            .collect::<Vec<_>>();
        hashes.sort_unstable_by_key(|(period, _)| *period);
        let newest = &hashes[hashes.len().saturating_sub(PLANNED_PERIODS)..];

        let mut numbers = Vec::with_capacity(newest.len());
        for &(period, hash) in newest {
            let number = retry(
                self.config.retry,
                "eth_getBlockByHash",
                format!("block {hash}"),
                |_| self.execution.block_number_by_hash(hash),
            )
            .await?;
            info!(period, %hash, number, "finalized execution block");
            numbers.push(number);
        }
        numbers.dedup();

        if numbers.len() < 2 {
            warn!(
                blocks = numbers.len(),
                "not enough finalized execution blocks to plan block ranges"
            );
        }
        plan_block_ranges(&numbers)
    }

    /// Writes the execution blocks of `range` to `execution_blocks_{start}_{end}.json`.
    ///
    /// # Errors
    /// Returns an error if a block can not be fetched or the file can not be written. Blocks
    /// written before the error stay in the unterminated file.
    pub async fn dump_blocks(&self, range: BlockRange) -> Result<FetchSummary, DumpError> {
        let path = self.path(&range.file_name());
        info!(
            %range,
            batch_size = self.config.batch_size,
            path = %path.display(),
            "dumping execution blocks"
        );

        let mut sink = JsonArraySink::new(BufWriter::new(File::create(&path)?))?;
        let summary = fetch_range(
            &self.execution,
            range.start,
            range.end,
            self.config.batch_size,
            self.config.retry,
            &mut sink,
        )
        .await?;
        sink.finish().await?;

        info!(
            blocks = summary.blocks_written,
            fallback_batches = summary.fallback_batches,
            path = %path.display(),
            "wrote execution blocks"
        );
        Ok(summary)
    }

    /// Writes the execution blocks within the configured window of the execution block of the
    /// finalized beacon block.
    ///
    /// # Errors
    /// Returns an error if the finalized block has no execution payload or a block can not be
    /// fetched or written.
    pub async fn dump_window(&self) -> Result<FetchSummary, DumpError> {
        let header = self.finalized_header().await?;
        let slot = header.slot;
        let body = retry(
            self.config.retry,
            "beacon block",
            format!("slot {slot}"),
            |_| self.beacon.beacon_block_body(slot),
        )
        .await?;

        let number = body
            .body
            .pointer("/execution_payload/block_number")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DumpError::decode(format!("slot {slot}"), "block without execution payload")
            })
            .and_then(|number| {
                parse_quantity(number).map_err(|e| DumpError::decode(format!("slot {slot}"), e))
            })?;

        self.dump_blocks(surrounding_window(number, self.config.block_window))
            .await
    }

    async fn finalized_header(&self) -> Result<BeaconBlockHeader, DumpError> {
        retry(
            self.config.retry,
            "beacon header",
            BlockId::Finalized,
            |_| self.beacon.beacon_header(BlockId::Finalized),
        )
        .await
    }

    async fn dump_periods(&self, periods: &[u64]) -> Result<Vec<DumpedUpdate>, DumpError> {
        info!(
            ?periods,
            output = %self.config.update_output,
            "dumping light client updates"
        );

        let spec = match retry(self.config.retry, "beacon spec", "fork schedule", |_| {
            self.beacon.spec()
        })
        .await
        {
            Ok(spec) => Some(spec),
            Err(err) => {
                warn!(%err, "no fork schedule, finalized execution headers take the update's fork");
                None
            }
        };

        let mut dumped = Vec::with_capacity(periods.len());
        for &period in periods {
            match self.dump_period(period, spec).await {
                Ok(Some(update)) => dumped.push(update),
                Ok(None) => warn!(period, "no light client update, skipping"),
                Err(DumpError::Io(err)) => return Err(DumpError::Io(err)),
                Err(err) => warn!(period, %err, "skipping period"),
            }
        }
        Ok(dumped)
    }

    async fn dump_period(
        &self,
        period: u64,
        spec: Option<Spec>,
    ) -> Result<Option<DumpedUpdate>, DumpError> {
        let path = self.path(&format!("light_client_update_period_{period}.json"));
        let subject = format!("period {period}");

        let responses: Vec<Response<Value, Version>> = match self.config.update_output {
            UpdateOutputMode::Canonical => {
                retry(self.config.retry, "light client updates", &subject, |_| {
                    self.beacon.light_client_updates(period, 1)
                })
                .await?
            }
            UpdateOutputMode::Raw => {
                let raw = retry(self.config.retry, "light client updates", &subject, |_| {
                    self.beacon.light_client_updates_raw(period, 1)
                })
                .await?;
                if raw.as_array().is_some_and(Vec::is_empty) {
                    return Ok(None);
                }
                write_json(&path, &raw)?;
                serde_json::from_value(raw).map_err(|e| DumpError::decode(&subject, e))?
            }
        };
        let Some(response) = responses.into_iter().next() else {
            return Ok(None);
        };

        let document = LightClientUpdateDocument::try_from(response)?;
        let finalized_slot = match &document {
            LightClientUpdateDocument::Canonical(update) => {
                Some(update.finality_update.header_update.beacon_header.slot)
            }
            LightClientUpdateDocument::Raw(update) => update.finalized_slot(),
        };

        let normalizer = Normalizer::new(
            &self.beacon,
            self.config.sync_committee_sentinel,
            self.config.retry,
        )
        .with_spec(spec);
        let normalized = normalizer.normalize(document).await;
        let execution_block_hash = match (self.config.update_output, normalized) {
            (UpdateOutputMode::Canonical, Ok(update)) => {
                write_json(&path, &update)?;
                Some(update.finality_update.header_update.execution_block_hash)
            }
            (UpdateOutputMode::Canonical, Err(err)) => return Err(err),
            (UpdateOutputMode::Raw, Ok(update)) => {
                Some(update.finality_update.header_update.execution_block_hash)
            }
            // the verbatim update is on disk, only planning misses this period
            (UpdateOutputMode::Raw, Err(err)) => {
                warn!(period, %err, "failed to normalize update");
                None
            }
        };

        info!(period, path = %path.display(), "wrote light client update");
        Ok(Some(DumpedUpdate {
            period,
            path,
            finalized_slot,
            execution_block_hash,
        }))
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.config.out_dir.join(file_name)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DumpError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use ethereum_merkle::ExecutionBlockProof;
    use ethereum_types::{
        consensus::{
            beacon_block::VersionedBeaconBlockBody, canonical::CanonicalLightClientUpdate,
            fork::ForkName, merkle::floorlog2,
        },
        execution::block::NormalizedExecutionBlock,
    };

    use super::*;
    use crate::{
        mock::{
            block_body, block_hash, light_client_update, MockBeaconSource, MockExecutionSource,
        },
        normalizer::SyncCommitteeSentinel,
        retry::RetryPolicy,
    };

    const CURRENT_PERIOD: u64 = 1_100;

    fn config(out_dir: &Path, update_output: UpdateOutputMode) -> DumpConfig {
        DumpConfig {
            network: "sepolia".to_string(),
            out_dir: out_dir.to_path_buf(),
            execution_rpc: vec!["http://localhost:8545".parse().unwrap()],
            consensus_api: "http://localhost:5052".parse().unwrap(),
            block_window: 5,
            batch_size: 8,
            retry: RetryPolicy::immediate(3),
            update_output,
            sync_committee_sentinel: SyncCommitteeSentinel::Omit,
            update_count: 4,
        }
    }

    /// Finalized execution blocks of the periods `CURRENT_PERIOD - 3..=CURRENT_PERIOD`.
    const BLOCK_NUMBERS: [(u64, u64); 4] =
        [(1_097, 100), (1_098, 120), (1_099, 150), (1_100, 190)];

    fn sources(fork_of: impl Fn(u64) -> ForkName) -> (MockExecutionSource, MockBeaconSource) {
        let mut execution = MockExecutionSource::default();
        let mut beacon = MockBeaconSource {
            finalized: BeaconBlockHeader {
                slot: CURRENT_PERIOD * 8192 + 300,
                ..Default::default()
            },
            ..Default::default()
        };
        for (period, number) in BLOCK_NUMBERS {
            execution = execution.with_block_hash(block_hash(number), number);
            beacon =
                beacon.with_update(period, light_client_update(fork_of(period), period, number));
        }
        (execution, beacon)
    }

    fn read<T: serde::de::DeserializeOwned>(path: &Path) -> T {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_run_all() {
        let dir = tempfile::tempdir().unwrap();
        // the oldest period is from before Deneb
        let (execution, beacon) = sources(|period| {
            if period < 1_098 {
                ForkName::Capella
            } else {
                ForkName::Deneb
            }
        });
        let dumper =
            Dumper::new(execution, beacon, config(dir.path(), UpdateOutputMode::Canonical))
                .unwrap();

        let report = dumper.run_all().await.unwrap();

        // the finalized header message
        let header: BeaconBlockHeader = read(
            &dir.path()
                .join(format!("beacon_header_{}.json", CURRENT_PERIOD * 8192 + 300)),
        );
        assert_eq!(report.header, header);

        // the updates of the 4 most recent periods, newest first
        assert_eq!(
            vec![1_100, 1_099, 1_098, 1_097],
            report.updates.iter().map(|u| u.period).collect::<Vec<_>>()
        );
        for (period, number) in BLOCK_NUMBERS {
            let fork = if period < 1_098 {
                ForkName::Capella
            } else {
                ForkName::Deneb
            };
            let update: CanonicalLightClientUpdate = read(
                &dir.path()
                    .join(format!("light_client_update_period_{period}.json")),
            );
            let header_update = &update.finality_update.header_update;
            assert_eq!(block_hash(number), header_update.execution_block_hash);
            assert_eq!(
                ExecutionBlockProof::depth(fork).unwrap(),
                header_update.execution_hash_branch.len()
            );
            assert_eq!(
                floorlog2(ExecutionBlockProof::gindex(fork).unwrap()),
                header_update.execution_hash_branch.len()
            );
            ExecutionBlockProof {
                block_hash: header_update.execution_block_hash,
                proof: header_update.execution_hash_branch.clone(),
            }
            .verify(fork, header_update.beacon_header.body_root)
            .unwrap();
        }

        // the block ranges between the newest 3 finalized execution blocks
        assert_eq!(
            vec![
                BlockRange { start: 120, end: 150 },
                BlockRange { start: 151, end: 190 },
            ],
            report.blocks.iter().map(|(range, _)| *range).collect::<Vec<_>>()
        );
        let blocks: Vec<NormalizedExecutionBlock> =
            read(&dir.path().join("execution_blocks_151_190.json"));
        assert_eq!(
            (151..=190).collect::<Vec<_>>(),
            blocks.iter().map(|block| block.number).collect::<Vec<_>>()
        );
        assert_eq!(40, report.blocks[1].1.blocks_written);
    }

    #[tokio::test]
    async fn test_failing_period_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (execution, mut beacon) = sources(|_| ForkName::Deneb);
        beacon.failing_periods.insert(1_099);
        let dumper =
            Dumper::new(execution, beacon, config(dir.path(), UpdateOutputMode::Canonical))
                .unwrap();

        let updates = dumper.dump_light_client_updates(4).await.unwrap();
        assert_eq!(
            vec![1_100, 1_098, 1_097],
            updates.iter().map(|u| u.period).collect::<Vec<_>>()
        );
        assert!(!dir
            .path()
            .join("light_client_update_period_1099.json")
            .exists());

        // planning uses the newest 3 periods that were dumped
        assert_eq!(
            vec![
                BlockRange { start: 100, end: 120 },
                BlockRange { start: 121, end: 190 },
            ],
            dumper.plan(&updates).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let (execution, beacon) = sources(|_| ForkName::Electra);
        let dumper =
            Dumper::new(execution, beacon, config(dir.path(), UpdateOutputMode::Raw)).unwrap();

        let updates = dumper.dump_light_client_updates(1).await.unwrap();
        assert_eq!(1, updates.len());
        assert_eq!(Some(block_hash(190)), updates[0].execution_block_hash);

        let raw: Vec<Response<Value, Version>> = read(&updates[0].path);
        assert_eq!(ForkName::Electra, raw[0].extra.version);
        assert!(raw[0].data.get("attested_header").is_some());
        assert!(raw[0].data.get("finality_update").is_none());
    }

    #[tokio::test]
    async fn test_raw_output_without_update() {
        let dir = tempfile::tempdir().unwrap();
        let (execution, mut beacon) = sources(|_| ForkName::Deneb);
        beacon.updates.remove(&CURRENT_PERIOD);
        let dumper =
            Dumper::new(execution, beacon, config(dir.path(), UpdateOutputMode::Raw)).unwrap();

        let updates = dumper.dump_light_client_updates(2).await.unwrap();
        assert_eq!(vec![1_099], updates.iter().map(|u| u.period).collect::<Vec<_>>());
        assert_eq!(Some(1_099 * 8192 + 64), updates[0].finalized_slot);
        assert!(!dir
            .path()
            .join(format!("light_client_update_period_{CURRENT_PERIOD}.json"))
            .exists());
    }

    #[tokio::test]
    async fn test_update_finalized_before_deneb_is_dumped() {
        let dir = tempfile::tempdir().unwrap();
        let (execution, mut beacon) = sources(|period| {
            if period < 1_100 {
                ForkName::Capella
            } else {
                ForkName::Deneb
            }
        });
        // the newest update is served by a deneb node, its finalized block is from capella
        let (mut response, _) = light_client_update(ForkName::Capella, CURRENT_PERIOD, 190);
        for header in ["attested_header", "finalized_header"] {
            response.data[header]["execution"]["blob_gas_used"] = serde_json::json!("0");
            response.data[header]["execution"]["excess_blob_gas"] = serde_json::json!("0");
        }
        response.extra.version = ForkName::Deneb;
        beacon.updates.insert(CURRENT_PERIOD, response);
        // deneb from the epoch after the finalized slot of the newest update
        beacon.spec = Some(Spec {
            slots_per_epoch: 32,
            altair_fork_epoch: 0,
            bellatrix_fork_epoch: 0,
            capella_fork_epoch: 0,
            deneb_fork_epoch: (CURRENT_PERIOD * 8192 + 64) / 32 + 1,
            electra_fork_epoch: None,
            fulu_fork_epoch: None,
        });
        let dumper =
            Dumper::new(execution, beacon, config(dir.path(), UpdateOutputMode::Canonical))
                .unwrap();

        let updates = dumper.dump_light_client_updates(2).await.unwrap();
        assert_eq!(
            vec![1_100, 1_099],
            updates.iter().map(|u| u.period).collect::<Vec<_>>()
        );
        assert_eq!(Some(block_hash(190)), updates[0].execution_block_hash);

        let update: CanonicalLightClientUpdate = read(&updates[0].path);
        let header_update = &update.finality_update.header_update;
        assert_eq!(
            ExecutionBlockProof::depth(ForkName::Capella).unwrap(),
            header_update.execution_hash_branch.len()
        );
    }

    #[tokio::test]
    async fn test_dump_window() {
        let dir = tempfile::tempdir().unwrap();
        let slot = 9_000_000;
        let beacon = MockBeaconSource {
            finalized: BeaconBlockHeader {
                slot,
                ..Default::default()
            },
            bodies: [(
                slot,
                VersionedBeaconBlockBody {
                    fork: ForkName::Deneb,
                    slot,
                    body: block_body(ForkName::Deneb, 3),
                },
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let dumper = Dumper::new(
            MockExecutionSource::default(),
            beacon,
            config(dir.path(), UpdateOutputMode::Canonical),
        )
        .unwrap();

        let summary = dumper.dump_window().await.unwrap();
        // clipped at block 0
        assert_eq!(9, summary.blocks_written);
        let blocks: Vec<NormalizedExecutionBlock> =
            read(&dir.path().join("execution_blocks_0_8.json"));
        assert_eq!(0, blocks[0].number);
    }

    #[tokio::test]
    async fn test_dump_window_without_execution_payload() {
        let dir = tempfile::tempdir().unwrap();
        let beacon = MockBeaconSource {
            bodies: [(
                0,
                VersionedBeaconBlockBody {
                    fork: ForkName::Altair,
                    slot: 0,
                    body: block_body(ForkName::Altair, 0),
                },
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let dumper = Dumper::new(
            MockExecutionSource::default(),
            beacon,
            config(dir.path(), UpdateOutputMode::Canonical),
        )
        .unwrap();

        assert!(matches!(
            dumper.dump_window().await,
            Err(DumpError::Decode { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = DumpConfig {
            batch_size: 0,
            ..config(dir.path(), UpdateOutputMode::Canonical)
        };
        assert!(matches!(
            Dumper::new(MockExecutionSource::default(), MockBeaconSource::default(), config),
            Err(DumpError::InvalidConfig(_))
        ));
    }
}
