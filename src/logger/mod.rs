//! Logger module - Structured logging with pluggable transports.
//!
//! ## Architecture
//!
//! - `AsyncLogger` - Filters by level and fans each message out to its
//!   transports, counting failures instead of propagating them
//! - `LogTransport` - Sink trait (`log` required, `flush`/`close` optional)
//! - `ConsoleTransport` - `[LEVEL][session] message` on stdout/stderr
//! - `ObservabilityTransport` - Forwards to an `Observability` backend
//! - `LoggerRegistry` - Named loggers plus transports shared by all of them
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use core_utils::logger::{ConsoleTransport, LogLevel, LoggerOptions, LoggerRegistry};
//!
//! # tokio_test_block(async {
//! let registry = LoggerRegistry::new();
//! let logger = registry.create(
//!     "checkout",
//!     LoggerOptions::default()
//!         .log_level(LogLevel::Info)
//!         .transport(Arc::new(ConsoleTransport::new())),
//! );
//!
//! logger.info("cart loaded").await;
//! registry.close_all().await;
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

mod async_logger;
mod console;
mod error;
mod level;
mod message;
mod observability;
mod registry;
mod transport;

pub use async_logger::{AsyncLogger, LoggerOptions, LoggerStats};
pub use console::ConsoleTransport;
pub use error::{Result, TransportError};
pub use level::{LogLevel, ParseLevelError};
pub use message::{LogContext, LogMessage};
pub use observability::{
    create_observability_transport, Observability, ObservabilityTransport, TracingObservability,
    COMPONENT, LOGGER_TAG,
};
pub use registry::{global_logger_registry, GlobalTransportScope, LoggerRegistry};
pub use transport::LogTransport;
