//! Destinations of normalized execution blocks.

use std::io::{self, Write};

use async_trait::async_trait;
use ethereum_types::execution::block::NormalizedExecutionBlock;
use tokio::sync::mpsc;

use crate::error::DumpError;

/// Receives the normalized blocks of a range, in ascending block number order.
#[async_trait]
pub trait BlockSink: Send {
    /// Writes one block.
    async fn write(&mut self, block: NormalizedExecutionBlock) -> Result<(), DumpError>;

    /// Completes the output after the last block.
    async fn finish(&mut self) -> Result<(), DumpError>;
}

/// Streams blocks as a JSON array, one element per line.
///
/// Every element is flushed as soon as it is written, so an aborted run leaves the blocks
/// written so far in an unterminated array.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct JsonArraySink<W: Write + Send> {
    writer: W,
    written: usize,
}

impl<W: Write + Send> JsonArraySink<W> {
    /// Opens the array on `writer`.
    ///
    /// # Errors
    /// Returns an error if writing the opening bracket fails.
    pub fn new(mut writer: W) -> Result<Self, DumpError> {
        writer.write_all(b"[\n")?;
        Ok(Self { writer, written: 0 })
    }

    /// The number of elements written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> BlockSink for JsonArraySink<W> {
    async fn write(&mut self, block: NormalizedExecutionBlock) -> Result<(), DumpError> {
        if self.written > 0 {
            self.writer.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut self.writer, &block)?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), DumpError> {
        self.writer.write_all(b"\n]")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Forwards blocks to a channel, e.g. to feed them to another task.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ChannelSink {
    sender: mpsc::Sender<NormalizedExecutionBlock>,
}

impl ChannelSink {
    /// Creates a sink sending to `sender`.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<NormalizedExecutionBlock>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl BlockSink for ChannelSink {
    async fn write(&mut self, block: NormalizedExecutionBlock) -> Result<(), DumpError> {
        self.sender.send(block).await.map_err(|_| {
            DumpError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "block receiver dropped",
            ))
        })
    }

    async fn finish(&mut self) -> Result<(), DumpError> {
        Ok(())
    }
}
