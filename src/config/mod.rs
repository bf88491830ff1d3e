//! Configuration module for the core-utils binary.
//!
//! Loads configuration from environment variables. Library components never
//! read the environment themselves; they receive the values built here.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::CacheConfig;
use crate::flags::EvaluateOptions;
use crate::logger::{LogLevel, LoggerOptions};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Minimum level for the application logger.
    pub log_level: LogLevel,

    /// Session id stamped on application log messages.
    pub session_id: String,

    // Cache
    pub cache_max_size: usize,
    /// Default entry TTL; unset means entries never expire.
    pub cache_ttl: Option<Duration>,

    // Flags
    pub flag_timeout: Duration,
    pub track_flag_metrics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            session_id: "core-utils".to_string(),
            cache_max_size: 1_000,
            cache_ttl: None,
            flag_timeout: Duration::from_millis(1_000),
            track_flag_metrics: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`).
    ///
    /// Every variable is optional; unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let session_id = lookup("CORE_UTILS_SESSION_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.session_id);

        let cache_max_size = parse_or(&lookup, "CACHE_MAX_SIZE", defaults.cache_max_size);
        let cache_max_size = if cache_max_size == 0 {
            warn!("CACHE_MAX_SIZE must be positive, using {}", defaults.cache_max_size);
            defaults.cache_max_size
        } else {
            cache_max_size
        };

        let cache_ttl = lookup("CACHE_TTL_SECS").and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                warn!("Ignoring invalid CACHE_TTL_SECS: {:?}", raw);
                None
            }
        });

        let timeout_ms = parse_or(
            &lookup,
            "FLAG_TIMEOUT_MS",
            defaults.flag_timeout.as_millis() as u64,
        );
        let flag_timeout = if timeout_ms == 0 {
            warn!("FLAG_TIMEOUT_MS must be positive, using default");
            defaults.flag_timeout
        } else {
            Duration::from_millis(timeout_ms)
        };

        Self {
            log_level: parse_or(&lookup, "CORE_UTILS_LOG_LEVEL", defaults.log_level),
            session_id,
            cache_max_size,
            cache_ttl,
            flag_timeout,
            track_flag_metrics: parse_or(&lookup, "FLAG_TRACK_METRICS", defaults.track_flag_metrics),
        }
    }

    /// Cache config for caches created by the application.
    pub fn cache_config(&self) -> CacheConfig {
        let config = CacheConfig::with_capacity(self.cache_max_size);
        match self.cache_ttl {
            Some(ttl) => config.ttl(ttl),
            None => config,
        }
    }

    /// Logger options without transports.
    pub fn logger_options(&self) -> LoggerOptions {
        LoggerOptions::new()
            .session_id(self.session_id.clone())
            .log_level(self.log_level)
    }

    /// Default options for flag batches.
    pub fn evaluate_options(&self) -> EvaluateOptions {
        EvaluateOptions::new()
            .timeout(self.flag_timeout)
            .track_metrics(self.track_flag_metrics)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}: {:?}", key, raw);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("CORE_UTILS_LOG_LEVEL", "warn"),
            ("CORE_UTILS_SESSION_ID", "web-1"),
            ("CACHE_MAX_SIZE", "64"),
            ("CACHE_TTL_SECS", "30"),
            ("FLAG_TIMEOUT_MS", "250"),
            ("FLAG_TRACK_METRICS", "false"),
        ]));

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.session_id, "web-1");
        assert_eq!(config.cache_max_size, 64);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(30)));
        assert_eq!(config.flag_timeout, Duration::from_millis(250));
        assert!(!config.track_flag_metrics);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("CORE_UTILS_LOG_LEVEL", "loud"),
            ("CACHE_MAX_SIZE", "0"),
            ("CACHE_TTL_SECS", "soon"),
            ("FLAG_TIMEOUT_MS", "-5"),
        ]));

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_derived_options() {
        let config = Config::from_lookup(lookup_from(&[("CACHE_TTL_SECS", "5")]));

        assert_eq!(config.cache_config().default_ttl, Some(Duration::from_secs(5)));
        assert_eq!(config.evaluate_options().timeout, Some(Duration::from_secs(1)));
        assert!(config.evaluate_options().track_metrics);
        assert_eq!(config.logger_options().session_id.as_deref(), Some("core-utils"));
    }
}
