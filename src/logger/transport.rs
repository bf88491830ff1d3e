//! Log transport trait.

use async_trait::async_trait;

use super::error::Result;
use super::LogMessage;

/// A sink that receives log messages from an [`AsyncLogger`](super::AsyncLogger).
///
/// Only `log` is required. Transports with buffers override `flush`; those
/// holding connections or handles override `close`. The defaults do nothing.
#[async_trait]
pub trait LogTransport: Send + Sync {
    /// Unique name within a logger. Used by `remove_transport`.
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn log(&self, message: &LogMessage) -> Result<()>;

    /// Push buffered messages to the sink.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources. Called at most once per logger.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
