//! Runs a parsed `eth-dumper` command against live endpoints.

use anyhow::{Context, Result};
use ethereum_apis::{
    beacon_api::client::BeaconApiClient,
    eth_api::{client::EthApiClient, error::EthClientError},
};
use ethereum_dumper::{endpoint::select_endpoint, plan::BlockRange, DumpConfig, DumpError, Dumper};
use tracing::{debug, info};
use url::Url;

use crate::cli::{Commands, EthDumperCli};

/// Selects the execution endpoint, then dumps what `cli.command` asks for.
///
/// # Errors
/// Returns an error if the configuration is invalid, no execution endpoint is reachable or the
/// command fails.
pub async fn run(cli: EthDumperCli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::All);
    let update_count = match command {
        Commands::Updates { count } => count,
        _ => DumpConfig::DEFAULT_UPDATE_COUNT,
    };
    let config = cli.args.dump_config(update_count);
    config.validate().context("Invalid configuration")?;

    info!(
        network = %config.network,
        out_dir = %config.out_dir.display(),
        update_output = %config.update_output,
        sync_committee_sentinel = %config.sync_committee_sentinel,
        "starting dump"
    );

    let execution_url = select_execution_endpoint(&config.execution_rpc)
        .await
        .context("Failed to select an execution endpoint")?;
    let execution = EthApiClient::new_http(execution_url);
    let beacon = BeaconApiClient::new(config.consensus_api.to_string());

    let dumper = Dumper::new(execution, beacon, config).context("Failed to prepare the output")?;

    match command {
        Commands::All => {
            let report = dumper.run_all().await.context("Failed to dump")?;
            info!(
                finalized_slot = report.header.slot,
                updates = report.updates.len(),
                block_ranges = report.blocks.len(),
                "dump complete"
            );
        }
        Commands::Header => {
            let header = dumper
                .dump_finalized_header()
                .await
                .context("Failed to dump the finalized beacon header")?;
            info!(slot = header.slot, "dumped finalized header");
        }
        Commands::Updates { count } => {
            let updates = dumper
                .dump_light_client_updates(count)
                .await
                .with_context(|| {
                    format!("Failed to dump the light client updates of {count} periods")
                })?;
            info!(updates = updates.len(), "dumped light client updates");
        }
        Commands::Blocks { start, end } => {
            let range = BlockRange::new(start, end).context("Invalid block range")?;
            let summary = dumper
                .dump_blocks(range)
                .await
                .with_context(|| format!("Failed to dump execution blocks {range}"))?;
            info!(%range, blocks = summary.blocks_written, "dumped execution blocks");
        }
        Commands::Window => {
            let summary = dumper
                .dump_window()
                .await
                .context("Failed to dump the blocks around the finalized execution block")?;
            info!(blocks = summary.blocks_written, "dumped execution block window");
        }
    }

    Ok(())
}

/// Returns the first endpoint answering `eth_chainId`.
async fn select_execution_endpoint(candidates: &[Url]) -> Result<Url, DumpError> {
    select_endpoint(candidates, |url| async move {
        let chain_id = EthApiClient::new_http(url.clone()).chain_id().await?;
        debug!(%url, chain_id, "execution endpoint answered");
        Ok::<_, EthClientError>(())
    })
    .await
}
