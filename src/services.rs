//! Shared service container.
//!
//! Holds one instance of each registry so consumers receive them
//! explicitly instead of reaching for the process-wide defaults.

use std::sync::Arc;

use crate::cache::CacheRegistry;
use crate::config::Config;
use crate::flags::{FlagManager, FlagManagerConfig};
use crate::logger::{AsyncLogger, LoggerRegistry};

/// Shared application services.
#[derive(Clone)]
pub struct Services {
    /// Named bounded caches.
    pub cache: CacheRegistry,

    /// Named loggers and their global transports.
    pub loggers: Arc<LoggerRegistry>,

    /// Registered feature flags.
    pub flags: Arc<FlagManager>,

    /// Configuration the services were built from.
    pub config: Arc<Config>,
}

impl Services {
    /// Build a fresh, isolated set of services.
    pub fn new(config: Config) -> Self {
        Self {
            cache: CacheRegistry::new(),
            loggers: Arc::new(LoggerRegistry::new()),
            flags: Arc::new(FlagManager::with_config(
                FlagManagerConfig::default().test_timeout(Some(config.flag_timeout)),
            )),
            config: Arc::new(config),
        }
    }

    /// Application logger named after the configured session id.
    pub fn app_logger(&self) -> Arc<AsyncLogger> {
        self.loggers
            .create(&self.config.session_id, self.config.logger_options())
    }

    /// Close every logger.
    pub async fn shutdown(&self) {
        self.loggers.close_all().await;
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("cache", &self.cache)
            .field("loggers", &self.loggers)
            .field("flags", &self.flags)
            .finish()
    }
}
