//! Configuration of a dump run.

use std::{fmt, path::PathBuf, str::FromStr};

use url::Url;

use crate::{error::DumpError, normalizer::SyncCommitteeSentinel, retry::RetryPolicy};

/// How light client updates are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateOutputMode {
    /// One canonical update per period file
    #[default]
    Canonical,
    /// The beacon API response for the period, verbatim
    Raw,
}

impl fmt::Display for UpdateOutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical => f.write_str("canonical"),
            Self::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for UpdateOutputMode {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canonical" => Ok(Self::Canonical),
            "raw" => Ok(Self::Raw),
            s => Err(DumpError::InvalidConfig(format!(
                "unknown update output `{s}`, expected `canonical` or `raw`"
            ))),
        }
    }
}

/// The configuration of a [`crate::Dumper`].
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct DumpConfig {
    /// The network name, e.g. `sepolia`
    pub network: String,
    /// The directory the files are written to
    pub out_dir: PathBuf,
    /// The execution JSON-RPC endpoints, in order of preference
    pub execution_rpc: Vec<Url>,
    /// The beacon API endpoint
    pub consensus_api: Url,
    /// The number of blocks dumped on each side of the finalized execution block
    pub block_window: u64,
    /// The number of blocks per batch request
    pub batch_size: u64,
    /// The retry policy of every network request
    pub retry: RetryPolicy,
    /// How light client updates are written
    pub update_output: UpdateOutputMode,
    /// How a missing next sync committee is written
    pub sync_committee_sentinel: SyncCommitteeSentinel,
    /// The number of recent periods whose updates are dumped
    pub update_count: u64,
}

impl DumpConfig {
    /// The default number of recent periods.
    pub const DEFAULT_UPDATE_COUNT: u64 = 4;

    /// Checks the configuration before anything is fetched.
    ///
    /// # Errors
    /// Returns [`DumpError::InvalidConfig`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), DumpError> {
        if self.execution_rpc.is_empty() {
            return Err(DumpError::InvalidConfig(
                "at least one execution rpc endpoint is required".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(DumpError::InvalidConfig(
                "batch size must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DumpError::InvalidConfig(
                "max retries must be positive".to_string(),
            ));
        }
        if self.update_count == 0 {
            return Err(DumpError::InvalidConfig(
                "update count must be positive".to_string(),
            ));
        }
        if self.network.is_empty() {
            return Err(DumpError::InvalidConfig("network must be named".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    fn config() -> DumpConfig {
        DumpConfig {
            network: "sepolia".to_string(),
            out_dir: PathBuf::from("./sepolia"),
            execution_rpc: vec!["https://ethereum-sepolia-rpc.publicnode.com"
                .parse()
                .unwrap()],
            consensus_api: "http://unstable.sepolia.beacon-api.nimbus.team"
                .parse()
                .unwrap(),
            block_window: 50,
            batch_size: 50,
            retry: RetryPolicy::default(),
            update_output: UpdateOutputMode::default(),
            sync_committee_sentinel: SyncCommitteeSentinel::default(),
            update_count: DumpConfig::DEFAULT_UPDATE_COUNT,
        }
    }

    #[test]
    fn test_valid_config() {
        config().validate().unwrap();
    }

    #[rstest]
    #[case::no_rpc(DumpConfig { execution_rpc: vec![], ..config() })]
    #[case::zero_batch(DumpConfig { batch_size: 0, ..config() })]
    #[case::zero_retries(DumpConfig { retry: RetryPolicy::immediate(0), ..config() })]
    #[case::zero_updates(DumpConfig { update_count: 0, ..config() })]
    #[case::no_network(DumpConfig { network: String::new(), ..config() })]
    fn test_invalid_config(#[case] config: DumpConfig) {
        assert!(matches!(config.validate(), Err(DumpError::InvalidConfig(_))));
    }

    #[test]
    fn test_update_output_mode() {
        assert_eq!(UpdateOutputMode::Canonical, "canonical".parse().unwrap());
        assert_eq!(UpdateOutputMode::Raw, "raw".parse().unwrap());
        assert!("verbatim".parse::<UpdateOutputMode>().is_err());
        assert_eq!("raw", UpdateOutputMode::Raw.to_string());
    }
}
