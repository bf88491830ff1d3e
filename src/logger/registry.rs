//! Logger registry - named loggers sharing global transports.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::{AsyncLogger, LogTransport, LoggerOptions, LoggerStats};

/// Which loggers a global transport is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlobalTransportScope {
    /// Loggers that exist when the transport is added and every logger
    /// created afterwards.
    #[default]
    AllLoggers,
    /// Only loggers that exist when the transport is added.
    ExistingOnly,
}

/// Registry of named [`AsyncLogger`]s.
///
/// ## Example
///
/// ```rust
/// use core_utils::logger::{LoggerOptions, LoggerRegistry};
///
/// let registry = LoggerRegistry::new();
/// let first = registry.create("checkout", LoggerOptions::default());
/// let again = registry.create("checkout", LoggerOptions::default());
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// ```
pub struct LoggerRegistry {
    loggers: RwLock<HashMap<String, Arc<AsyncLogger>>>,
    global_transports: RwLock<Vec<Arc<dyn LogTransport>>>,
    scope: GlobalTransportScope,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::with_scope(GlobalTransportScope::default())
    }

    pub fn with_scope(scope: GlobalTransportScope) -> Self {
        info!("Logger registry initialized");
        Self {
            loggers: RwLock::new(HashMap::new()),
            global_transports: RwLock::new(Vec::new()),
            scope,
        }
    }

    pub fn scope(&self) -> GlobalTransportScope {
        self.scope
    }

    /// Create a named logger, or return the existing one.
    ///
    /// `options` only apply on the first call for a name. The session id
    /// defaults to the logger name.
    pub fn create(&self, name: &str, options: LoggerOptions) -> Arc<AsyncLogger> {
        let mut loggers = self.loggers.write();

        if let Some(existing) = loggers.get(name) {
            return Arc::clone(existing);
        }

        debug!("Creating logger: {}", name);
        let mut options = options;
        if options.session_id.is_none() {
            options.session_id = Some(name.to_string());
        }

        let logger = Arc::new(AsyncLogger::new(options));
        if self.scope == GlobalTransportScope::AllLoggers {
            for transport in self.global_transports.read().iter() {
                logger.add_transport(Arc::clone(transport));
            }
        }

        loggers.insert(name.to_string(), Arc::clone(&logger));
        logger
    }

    pub fn get(&self, name: &str) -> Option<Arc<AsyncLogger>> {
        self.loggers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    /// Registered logger names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Close a logger and drop it from the registry.
    ///
    /// Returns `true` if the logger existed.
    pub async fn close(&self, name: &str) -> bool {
        let logger = self.loggers.write().remove(name);
        match logger {
            Some(logger) => {
                logger.close().await;
                debug!("Closed logger: {}", name);
                true
            }
            None => false,
        }
    }

    /// Close and drop every logger.
    pub async fn close_all(&self) {
        let loggers: Vec<Arc<AsyncLogger>> =
            self.loggers.write().drain().map(|(_, logger)| logger).collect();
        join_all(loggers.iter().map(|logger| logger.close())).await;
        debug!("Closed {} loggers", loggers.len());
    }

    /// Attach a transport to every registered logger.
    pub fn add_global_transport(&self, transport: Arc<dyn LogTransport>) {
        // Lock order matches `create`: loggers, then globals
        let loggers = self.loggers.read();
        for logger in loggers.values() {
            logger.add_transport(Arc::clone(&transport));
        }

        let mut globals = self.global_transports.write();
        globals.retain(|t| t.name() != transport.name());
        globals.push(transport);
    }

    /// Detach a global transport from every registered logger.
    ///
    /// Returns `true` if it was registered as global.
    pub fn remove_global_transport(&self, name: &str) -> bool {
        let loggers = self.loggers.read();
        for logger in loggers.values() {
            logger.remove_transport(name);
        }

        let mut globals = self.global_transports.write();
        let before = globals.len();
        globals.retain(|t| t.name() != name);
        globals.len() != before
    }

    /// Names of the global transports, in insertion order.
    pub fn global_transports(&self) -> Vec<String> {
        self.global_transports
            .read()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Stats snapshot for every registered logger.
    pub fn get_global_stats(&self) -> HashMap<String, LoggerStats> {
        self.loggers
            .read()
            .iter()
            .map(|(name, logger)| (name.clone(), logger.stats()))
            .collect()
    }

    /// Drop every logger and global transport without closing them.
    pub fn reset_for_tests(&self) {
        self.loggers.write().clear();
        self.global_transports.write().clear();
    }
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.names())
            .field("global_transports", &self.global_transports())
            .field("scope", &self.scope)
            .finish()
    }
}

static GLOBAL_LOGGER_REGISTRY: Lazy<LoggerRegistry> = Lazy::new(LoggerRegistry::new);

/// Process-wide default logger registry.
pub fn global_logger_registry() -> &'static LoggerRegistry {
    &GLOBAL_LOGGER_REGISTRY
}
