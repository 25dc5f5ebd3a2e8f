//! Fetches ranges of execution blocks in batches, falling back to single requests.

use ethereum_types::execution::block::NormalizedExecutionBlock;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::DumpError,
    plan::BlockRange,
    retry::{retry, RetryPolicy},
    sink::BlockSink,
    sources::ExecutionBlockSource,
};

/// Progress of a [`fetch_range`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchSummary {
    /// Blocks written to the sink
    pub blocks_written: u64,
    /// Batches fetched
    pub batches: u64,
    /// Batches that were fetched block by block after the batch request kept failing
    pub fallback_batches: u64,
}

/// Fetches the blocks `start..=end` from `source` and writes them, normalized and in ascending
/// order, to `sink`.
///
/// Each batch of `batch_size` blocks is one request retried according to `policy`. A response
/// missing one of the requested blocks counts as a failed attempt. Once a batch exhausted its
/// attempts, its blocks are fetched one by one, each with the same policy.
///
/// The sink is not finished, so several ranges can be written to the same sink.
///
/// # Errors
/// Returns [`DumpError::InvalidConfig`] before any request if `start > end` or `batch_size` is 0,
/// and [`DumpError::ExhaustedRetries`] naming the block if a single block can not be fetched.
#[tracing::instrument(skip(source, policy, sink))]
pub async fn fetch_range<S, K>(
    source: &S,
    start: u64,
    end: u64,
    batch_size: u64,
    policy: RetryPolicy,
    sink: &mut K,
) -> Result<FetchSummary, DumpError>
where
    S: ExecutionBlockSource + ?Sized,
    K: BlockSink + ?Sized,
{
    let range = BlockRange::new(start, end)?;
    if batch_size == 0 {
        return Err(DumpError::InvalidConfig(
            "batch size must be positive".to_string(),
        ));
    }

    let mut summary = FetchSummary::default();
    for batch in range.chunks(batch_size) {
        let numbers = (batch.start..=batch.end).collect::<Vec<_>>();
        let numbers = numbers.as_slice();

        let blocks = match retry(policy, "eth_getBlockByNumber batch", batch, |_| async move {
            complete_batch(numbers, source.blocks(numbers).await?)
        })
        .await
        {
            Ok(blocks) => blocks,
            Err(DumpError::ExhaustedRetries { source: err, .. }) => {
                warn!(%batch, %err, "batch failed, fetching its blocks one by one");
                summary.fallback_batches += 1;
                fetch_each(source, numbers, policy).await?
            }
            Err(err) => return Err(err),
        };

        for (number, raw) in numbers.iter().zip(blocks) {
            let block = NormalizedExecutionBlock::from_raw(&raw)
                .map_err(|e| DumpError::decode(format!("block {number}"), e))?;
            sink.write(block).await?;
            summary.blocks_written += 1;
        }
        summary.batches += 1;

        info!(
            written = summary.blocks_written,
            total = range.block_count(),
            "fetched blocks {batch}"
        );
    }

    Ok(summary)
}

async fn fetch_each<S>(
    source: &S,
    numbers: &[u64],
    policy: RetryPolicy,
) -> Result<Vec<Value>, DumpError>
where
    S: ExecutionBlockSource + ?Sized,
{
    let mut blocks = Vec::with_capacity(numbers.len());
    for &number in numbers {
        let block = retry(
            policy,
            "eth_getBlockByNumber",
            format!("block {number}"),
            |_| source.block(number),
        )
        .await?;
        blocks.push(block);
    }
    Ok(blocks)
}

fn complete_batch(numbers: &[u64], blocks: Vec<Option<Value>>) -> Result<Vec<Value>, DumpError> {
    if blocks.len() != numbers.len() {
        return Err(DumpError::Transport(format!(
            "batch response has {} blocks, expected {}",
            blocks.len(),
            numbers.len()
        )));
    }

    numbers
        .iter()
        .zip(blocks)
        .map(|(number, block)| {
            block.ok_or_else(|| {
                DumpError::Transport(format!("block {number} missing from batch response"))
            })
        })
        .collect()
}
