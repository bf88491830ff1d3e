//! core-utils - Shared runtime utilities
//!
//! Three independent components for application code:
//!
//! ## Architecture
//!
//! - `cache` - Bounded key/value cache with FIFO eviction and TTL expiry
//! - `logger` - Async structured logger fanning out to pluggable transports
//! - `flags` - Feature-flag registry with concurrent, time-bounded evaluation
//! - `config` - Environment configuration for the binary
//! - `services` - Container wiring one instance of each registry
//!
//! Each registry also has a process-wide default (`global_cache_registry`,
//! `global_logger_registry`, `flag_manager`) for call sites that are not
//! handed a [`Services`].

pub mod cache;
pub mod config;
pub mod flags;
pub mod logger;
mod services;

pub use services::Services;
