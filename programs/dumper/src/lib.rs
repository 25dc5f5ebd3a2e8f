//! The `eth-dumper` command line: argument parsing, logging setup and command dispatch.
#![deny(clippy::nursery, clippy::pedantic)]

pub mod cli;
pub mod runner;
pub mod tracing;
