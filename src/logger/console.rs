//! Console transport - writes formatted lines to stdout/stderr.

use std::io::Write;

use async_trait::async_trait;

use super::error::Result;
use super::{LogLevel, LogMessage, LogTransport};

/// Writes `[LEVEL][session] message` lines.
///
/// Debug and info go to stdout, warn and error to stderr.
#[derive(Debug, Clone)]
pub struct ConsoleTransport {
    name: String,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self::named("console")
    }

    /// Console transport registered under a custom name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Render a message the way it is printed.
    pub fn format(message: &LogMessage) -> String {
        format!(
            "[{}][{}] {}",
            message.level.label(),
            message.session_id,
            message.message
        )
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogTransport for ConsoleTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn log(&self, message: &LogMessage) -> Result<()> {
        let line = Self::format(message);
        match message.level {
            LogLevel::Debug | LogLevel::Info => writeln!(std::io::stdout().lock(), "{line}")?,
            LogLevel::Warn | LogLevel::Error => writeln!(std::io::stderr().lock(), "{line}")?,
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }
}
