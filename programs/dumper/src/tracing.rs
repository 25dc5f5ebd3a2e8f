//! Logging setup of the `eth-dumper` binary.

use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Installs a pretty printing subscriber filtered by `level` as the global default.
///
/// `level` takes any `RUST_LOG` style directive, e.g. `info` or `ethereum_dumper=debug`.
#[allow(clippy::missing_errors_doc)]
pub fn init_subscriber(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("Invalid log level directive `{level}`"))?;

    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(true),
    );

    try_init_subscriber(subscriber)
}

fn try_init_subscriber(subscriber: impl SubscriberInitExt) -> Result<()> {
    subscriber
        .try_init()
        .context("Failed to set global default subscriber")
}
