//! Cache module - Bounded in-process caching.
//!
//! This module provides a registry-based caching system that allows
//! components to memoize expensive lookups in their own named caches.
//!
//! ## Architecture
//!
//! - `CacheRegistry` - Central registry holding all named caches
//! - `BoundedCache` - Size-bounded cache with FIFO eviction and TTL expiry
//! - `CacheConfig` - Capacity and default TTL, with presets
//! - `Clock` - Time source, swappable for tests
//!
//! ## Usage
//!
//! ```rust
//! use core_utils::cache::{BoundedCache, CacheConfig, CacheRegistry};
//!
//! let registry = CacheRegistry::new();
//! let translations: BoundedCache<String, String> =
//!     registry.create("seo_translations", CacheConfig::cold_data());
//!
//! translations.set("home.title".to_string(), "Home".to_string());
//! assert_eq!(translations.get(&"home.title".to_string()).as_deref(), Some("Home"));
//! ```

mod bounded;
mod clock;
mod config;
mod registry;

pub use bounded::{BoundedCache, CacheStats};
pub use clock::{Clock, MockClock, SystemClock};
pub use config::CacheConfig;
pub use registry::{global_cache_registry, CacheRegistry};
