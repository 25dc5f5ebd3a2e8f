//! Dumps beacon headers, light client updates and execution blocks of an Ethereum network.

use clap::Parser;
use ethereum_dumper_cli::{cli::EthDumperCli, runner::run, tracing::init_subscriber};
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before parsing so that `.env` entries fill in unset options.
    let dotenv = dotenv::dotenv();

    let cli = EthDumperCli::parse();
    init_subscriber(&cli.args.log_level)?;

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => debug!("no environment file found"),
        Err(err) => warn!(%err, "failed to load environment file"),
    }

    run(cli).await
}
