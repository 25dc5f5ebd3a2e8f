//! Clients for the Ethereum beacon API and the execution JSON-RPC API.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod beacon_api;
pub mod eth_api;
