//! The execution JSON-RPC client.

pub mod client;
pub mod error;
