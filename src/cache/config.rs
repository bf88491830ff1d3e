//! Cache configuration.

use std::time::Duration;

/// Configuration for a bounded cache instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries in the cache.
    /// Inserting a new key at capacity evicts the oldest-inserted entry.
    pub max_size: usize,

    /// Default time-to-live for entries inserted without an explicit TTL.
    /// `None` means entries never expire.
    pub default_ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1_000,
            default_ttl: None,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with the given max size.
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            max_size,
            ..Default::default()
        }
    }

    /// Set max size for cache (builder pattern).
    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set the default time-to-live for cache entries.
    #[must_use]
    pub fn ttl(mut self, duration: Duration) -> Self {
        self.default_ttl = Some(duration);
        self
    }

    /// Disable the default TTL (entries never expire unless set with one).
    #[must_use]
    pub fn no_ttl(mut self) -> Self {
        self.default_ttl = None;
        self
    }

    /// Config for frequently recomputed lookups.
    /// Higher capacity, short TTL.
    pub fn hot_data() -> Self {
        Self {
            max_size: 5_000,
            default_ttl: Some(Duration::from_secs(60)), // 1 minute
        }
    }

    /// Config for rarely changing data such as translations.
    /// Lower capacity, long TTL.
    pub fn cold_data() -> Self {
        Self {
            max_size: 500,
            default_ttl: Some(Duration::from_secs(3600)), // 1 hour
        }
    }

    /// Config for per-session memoization.
    pub fn session_data() -> Self {
        Self {
            max_size: 2_000,
            default_ttl: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let config = CacheConfig::with_capacity(10).ttl(Duration::from_millis(250));
        assert_eq!(config.max_size, 10);
        assert_eq!(config.default_ttl, Some(Duration::from_millis(250)));

        let config = config.no_ttl().max_size(3);
        assert_eq!(config.max_size, 3);
        assert_eq!(config.default_ttl, None);
    }

    #[test]
    fn test_default_never_expires() {
        assert_eq!(CacheConfig::default().default_ttl, None);
    }
}
