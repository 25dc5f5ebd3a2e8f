//! Command line arguments of `eth-dumper`.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use ethereum_dumper::{
    normalizer::SyncCommitteeSentinel, DumpConfig, RetryPolicy, UpdateOutputMode,
};
use url::Url;

/// The default public execution endpoint.
pub const DEFAULT_EXECUTION_RPC: &str = "https://ethereum-sepolia-rpc.publicnode.com";
/// The default public beacon API endpoint.
pub const DEFAULT_CONSENSUS_API: &str = "http://unstable.sepolia.beacon-api.nimbus.team";

/// The command line interface of `eth-dumper`.
#[derive(Clone, Debug, Parser)]
#[command(
    name = "eth-dumper",
    version,
    about = "Dumps beacon headers, light client updates and execution blocks of an Ethereum network"
)]
pub struct EthDumperCli {
    /// Options shared by every command
    #[command(flatten)]
    pub args: DumpArgs,

    /// What to dump, everything if omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// The commands of `eth-dumper`.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Dump the finalized header, recent light client updates and the blocks between them
    All,
    /// Dump the finalized beacon header
    Header,
    /// Dump the light client updates of the most recent periods
    Updates {
        /// The number of periods, ending with the current one
        #[arg(long, default_value_t = DumpConfig::DEFAULT_UPDATE_COUNT)]
        count: u64,
    },
    /// Dump an explicit range of execution blocks
    Blocks {
        /// The first block of the range
        #[arg(long)]
        start: u64,
        /// The last block of the range, inclusive
        #[arg(long)]
        end: u64,
    },
    /// Dump the execution blocks around the finalized execution block
    Window,
}

/// Options shared by every command. Each can also be set through its environment variable.
#[derive(Clone, Debug, Args)]
#[allow(clippy::struct_field_names)]
pub struct DumpArgs {
    /// The network name, also the default output directory
    #[arg(long, env = "NETWORK", default_value = "sepolia")]
    pub network: String,

    /// The output directory [default: ./<network>]
    #[arg(long, env = "OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Comma separated execution JSON-RPC endpoints, the first reachable one is used
    #[arg(
        long,
        env = "EXECUTION_RPC",
        value_delimiter = ',',
        default_value = DEFAULT_EXECUTION_RPC
    )]
    pub execution_rpc: Vec<Url>,

    /// The beacon API endpoint
    #[arg(long, env = "CONSENSUS_API", default_value = DEFAULT_CONSENSUS_API)]
    pub consensus_api: Url,

    /// The number of blocks dumped on each side of the finalized execution block
    #[arg(long, env = "BLOCK_WINDOW", default_value_t = 50)]
    pub block_window: u64,

    /// The number of blocks requested per batch
    #[arg(long, env = "BATCH_SIZE", default_value_t = 50)]
    pub batch_size: u64,

    /// The number of attempts of every request
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// The delay between attempts, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// How light client updates are written: `canonical` or `raw`
    #[arg(long, env = "UPDATE_OUTPUT", default_value_t = UpdateOutputMode::Canonical)]
    pub update_output: UpdateOutputMode,

    /// How a missing next sync committee is written: `omit` or `null`
    #[arg(long, env = "SYNC_COMMITTEE_SENTINEL", default_value_t = SyncCommitteeSentinel::Omit)]
    pub sync_committee_sentinel: SyncCommitteeSentinel,

    /// The log filter
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl DumpArgs {
    /// The output directory, `./<network>` unless set.
    #[must_use]
    pub fn out_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".").join(&self.network))
    }

    /// The dump configuration described by these arguments.
    #[must_use]
    pub fn dump_config(&self, update_count: u64) -> DumpConfig {
        DumpConfig {
            network: self.network.clone(),
            out_dir: self.out_dir(),
            execution_rpc: self.execution_rpc.clone(),
            consensus_api: self.consensus_api.clone(),
            block_window: self.block_window,
            batch_size: self.batch_size,
            retry: RetryPolicy {
                max_attempts: self.max_retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
            update_output: self.update_output,
            sync_committee_sentinel: self.sync_committee_sentinel,
            update_count,
        }
    }
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        EthDumperCli::command().debug_assert();
    }

    #[test]
    fn test_blocks_command() {
        let cli = EthDumperCli::try_parse_from([
            "eth-dumper",
            "--network",
            "holesky",
            "--execution-rpc",
            "http://localhost:8545,https://rpc.example.org",
            "--update-output",
            "raw",
            "--sync-committee-sentinel",
            "null",
            "--max-retries",
            "5",
            "--retry-delay-ms",
            "10",
            "blocks",
            "--start",
            "100",
            "--end",
            "150",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Some(Commands::Blocks {
                start: 100,
                end: 150
            })
        ));

        let config = cli.args.dump_config(DumpConfig::DEFAULT_UPDATE_COUNT);
        assert_eq!("holesky", config.network);
        assert_eq!(PathBuf::from("./holesky"), config.out_dir);
        assert_eq!(
            vec![
                Url::parse("http://localhost:8545").unwrap(),
                Url::parse("https://rpc.example.org").unwrap()
            ],
            config.execution_rpc
        );
        assert_eq!(UpdateOutputMode::Raw, config.update_output);
        assert_eq!(SyncCommitteeSentinel::Null, config.sync_committee_sentinel);
        assert_eq!(5, config.retry.max_attempts);
        assert_eq!(Duration::from_millis(10), config.retry.delay);
        config.validate().unwrap();
    }

    #[test]
    fn test_updates_command() {
        let cli = EthDumperCli::try_parse_from([
            "eth-dumper",
            "--out-dir",
            "/tmp/dump",
            "updates",
            "--count",
            "2",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Updates { count: 2 })));
        assert_eq!(PathBuf::from("/tmp/dump"), cli.args.out_dir());
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(EthDumperCli::try_parse_from(["eth-dumper", "--update-output", "yaml"]).is_err());
        assert!(EthDumperCli::try_parse_from(["eth-dumper", "--execution-rpc", "not a url"]).is_err());
        assert!(EthDumperCli::try_parse_from(["eth-dumper", "blocks", "--start", "1"]).is_err());
    }
}
