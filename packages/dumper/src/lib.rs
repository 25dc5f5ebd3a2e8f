//! Dumps the data an Ethereum light client bridge is bootstrapped and tested with: the finalized
//! beacon header, light client updates normalized to the canonical format (with the proof of the
//! finalized execution block hash) and ranges of execution blocks.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod config;
pub mod dump;
pub mod endpoint;
pub mod error;
pub mod fetcher;
#[cfg(test)]
mod mock;
pub mod normalizer;
pub mod plan;
pub mod retry;
pub mod sink;
pub mod sources;

pub use config::{DumpConfig, UpdateOutputMode};
pub use dump::Dumper;
pub use error::DumpError;
pub use retry::RetryPolicy;
