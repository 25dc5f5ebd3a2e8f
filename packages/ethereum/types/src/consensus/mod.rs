//! This module contains types assosicated with the beacon api and Ethereum consensus.

pub mod beacon_block;
pub mod bls;
pub mod canonical;
pub mod fork;
pub mod light_client_header;
pub mod light_client_update;
pub mod merkle;
pub mod spec;
pub mod sync_committee;
