//! Error types for log transports.

use thiserror::Error;

/// Errors a transport can report back to the logger.
///
/// The logger counts these and never propagates them to the log call site.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The sink rejected or failed to deliver a message.
    #[error("Transport '{transport}' failed: {reason}")]
    Delivery { transport: String, reason: String },

    /// The transport panicked while handling a call.
    #[error("Transport '{0}' panicked")]
    Panicked(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Shorthand for a delivery failure.
    pub fn delivery(transport: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Delivery {
            transport: transport.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
