//! The beacon API client and its response types.

pub mod client;
pub mod error;
pub mod response;
