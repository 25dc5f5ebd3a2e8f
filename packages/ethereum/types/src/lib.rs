//! Types shared by the beacon and execution API clients, the merkle proof engine and the dumper.
//!
//! The [`consensus`] module covers beacon chain data as returned by the beacon API, including the
//! fork-tagged raw light client updates and the canonical update format consumed downstream. The
//! [`execution`] module covers execution layer blocks.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod consensus;
pub mod execution;
