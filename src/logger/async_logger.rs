//! Async logger with transport fan-out.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::{Result, TransportError};
use super::{LogContext, LogLevel, LogMessage, LogTransport};

/// Construction options for an [`AsyncLogger`].
#[derive(Clone, Default)]
pub struct LoggerOptions {
    /// Session identifier stamped on every message.
    /// Defaults to `session-<unix millis>`.
    pub session_id: Option<String>,

    /// Minimum level that reaches transports.
    pub log_level: LogLevel,

    /// Initial transports, in dispatch order.
    pub transports: Vec<Arc<dyn LogTransport>>,
}

impl LoggerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn LogTransport>) -> Self {
        self.transports.push(transport);
        self
    }
}

impl std::fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("session_id", &self.session_id)
            .field("log_level", &self.log_level)
            .field(
                "transports",
                &self.transports.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Snapshot of a logger's cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerStats {
    pub messages_logged: u64,
    pub bytes_written: u64,
    pub flush_count: u64,
    pub errors: u64,
}

#[derive(Default)]
struct StatsCounters {
    messages_logged: AtomicU64,
    bytes_written: AtomicU64,
    flush_count: AtomicU64,
    errors: AtomicU64,
}

/// Structured logger that fans each message out to its transports.
///
/// A failing or panicking transport is counted in `stats().errors` and
/// never stops delivery to the others. Once [`close`](Self::close) starts
/// the logger ignores every log call.
pub struct AsyncLogger {
    session_id: String,
    log_level: LogLevel,
    transports: RwLock<Vec<Arc<dyn LogTransport>>>,
    stats: StatsCounters,
    /// Set as soon as the first `close` starts; gates `log`.
    closing: AtomicBool,
    /// Completes when transports have been flushed and closed.
    shutdown: OnceCell<()>,
}

impl AsyncLogger {
    pub fn new(options: LoggerOptions) -> Self {
        let session_id = options
            .session_id
            .unwrap_or_else(|| format!("session-{}", Utc::now().timestamp_millis()));

        Self {
            session_id,
            log_level: options.log_level,
            transports: RwLock::new(options.transports),
            stats: StatsCounters::default(),
            closing: AtomicBool::new(false),
            shutdown: OnceCell::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    /// Whether shutdown has finished.
    pub fn is_closed(&self) -> bool {
        self.shutdown.initialized()
    }

    /// Log at `level`, waiting until every transport has settled.
    pub async fn log(&self, level: LogLevel, message: impl Into<String>, context: Option<LogContext>) {
        if self.closing.load(Ordering::Acquire) || level < self.log_level {
            return;
        }

        let message = LogMessage::new(level, message, self.session_id.as_str(), context);
        let transports = self.transports.read().clone();

        let results = join_all(
            transports
                .iter()
                .map(|transport| guarded(transport.name(), transport.log(&message))),
        )
        .await;
        self.record_failures("log", results);

        self.stats.messages_logged.fetch_add(1, Ordering::Relaxed);
        self.stats
            .bytes_written
            .fetch_add(message.encoded_len() as u64, Ordering::Relaxed);
    }

    /// Log without waiting for delivery. Requires a tokio runtime.
    pub fn log_detached(
        self: &Arc<Self>,
        level: LogLevel,
        message: impl Into<String>,
        context: Option<LogContext>,
    ) -> tokio::task::JoinHandle<()> {
        let logger = Arc::clone(self);
        let message = message.into();
        tokio::spawn(async move { logger.log(level, message, context).await })
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None).await;
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message, None).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None).await;
    }

    pub async fn debug_with(&self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Debug, message, Some(context)).await;
    }

    pub async fn info_with(&self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Info, message, Some(context)).await;
    }

    pub async fn warn_with(&self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Warn, message, Some(context)).await;
    }

    pub async fn error_with(&self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Error, message, Some(context)).await;
    }

    /// Flush every transport.
    pub async fn flush(&self) {
        self.stats.flush_count.fetch_add(1, Ordering::Relaxed);
        let transports = self.transports.read().clone();

        let results = join_all(
            transports
                .iter()
                .map(|transport| guarded(transport.name(), transport.flush())),
        )
        .await;
        self.record_failures("flush", results);
    }

    /// Stop accepting messages, then flush and close every transport.
    ///
    /// Only the first call does any work. Concurrent callers wait until
    /// that shutdown has finished.
    pub async fn close(&self) {
        self.closing.store(true, Ordering::Release);
        self.shutdown.get_or_init(|| self.shutdown_transports()).await;
    }

    async fn shutdown_transports(&self) {
        self.flush().await;

        let transports = self.transports.read().clone();
        let results = join_all(
            transports
                .iter()
                .map(|transport| guarded(transport.name(), transport.close())),
        )
        .await;
        self.record_failures("close", results);

        debug!("Logger '{}' closed", self.session_id);
    }

    /// Add a transport. A transport with the same name is replaced in place.
    pub fn add_transport(&self, transport: Arc<dyn LogTransport>) {
        let mut transports = self.transports.write();
        match transports.iter().position(|t| t.name() == transport.name()) {
            Some(index) => transports[index] = transport,
            None => transports.push(transport),
        }
    }

    /// Remove a transport by name. Returns `true` if one was removed.
    pub fn remove_transport(&self, name: &str) -> bool {
        let mut transports = self.transports.write();
        let before = transports.len();
        transports.retain(|t| t.name() != name);
        transports.len() != before
    }

    pub fn has_transport(&self, name: &str) -> bool {
        self.transports.read().iter().any(|t| t.name() == name)
    }

    /// Transport names in dispatch order.
    pub fn get_transports(&self) -> Vec<String> {
        self.transports
            .read()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            messages_logged: self.stats.messages_logged.load(Ordering::Relaxed),
            bytes_written: self.stats.bytes_written.load(Ordering::Relaxed),
            flush_count: self.stats.flush_count.load(Ordering::Relaxed),
            errors: self.stats.errors.load(Ordering::Relaxed),
        }
    }

    fn record_failures(&self, operation: &str, results: Vec<Result<()>>) {
        for err in results.into_iter().filter_map(|r| r.err()) {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Logger '{}' transport {} failed: {}",
                self.session_id, operation, err
            );
        }
    }
}

impl std::fmt::Debug for AsyncLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLogger")
            .field("session_id", &self.session_id)
            .field("log_level", &self.log_level)
            .field("transports", &self.get_transports())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Await a transport call, turning a panic into an error.
async fn guarded<F>(name: &str, call: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Panicked(name.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Transport that records calls and can be told to fail.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub name: String,
        pub fail: bool,
        pub messages: Mutex<Vec<LogMessage>>,
        pub flush_delay: Option<std::time::Duration>,
        pub flushes: AtomicU64,
        pub closes: AtomicU64,
    }

    impl RecordingTransport {
        pub(crate) fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                ..Default::default()
            })
        }

        pub(crate) fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail: true,
                ..Default::default()
            })
        }

        pub(crate) fn slow_flush(name: &str, delay: std::time::Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                flush_delay: Some(delay),
                ..Default::default()
            })
        }

        pub(crate) fn count(&self) -> usize {
            self.messages.lock().len()
        }
    }

    #[async_trait]
    impl LogTransport for RecordingTransport {
        fn name(&self) -> &str {
            &self.name
        }

        async fn log(&self, message: &LogMessage) -> Result<()> {
            self.messages.lock().push(message.clone());
            if self.fail {
                return Err(TransportError::delivery(&self.name, "sink unavailable"));
            }
            Ok(())
        }

        async fn flush(&self) -> Result<()> {
            if let Some(delay) = self.flush_delay {
                tokio::time::sleep(delay).await;
            }
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct PanickingTransport;

    #[async_trait]
    impl LogTransport for PanickingTransport {
        fn name(&self) -> &str {
            "panicky"
        }

        async fn log(&self, _message: &LogMessage) -> Result<()> {
            panic!("sink exploded");
        }
    }

    /// Transport with no flush/close overrides.
    struct MinimalTransport;

    #[async_trait]
    impl LogTransport for MinimalTransport {
        fn name(&self) -> &str {
            "minimal"
        }

        async fn log(&self, _message: &LogMessage) -> Result<()> {
            Ok(())
        }
    }

    fn logger_with(level: LogLevel, transports: Vec<Arc<dyn LogTransport>>) -> AsyncLogger {
        AsyncLogger::new(LoggerOptions {
            session_id: Some("test-session".into()),
            log_level: level,
            transports,
        })
    }

    #[tokio::test]
    async fn test_level_filtering() {
        let sink = RecordingTransport::new("sink");
        let logger = logger_with(LogLevel::Warn, vec![sink.clone()]);

        logger.debug("d").await;
        logger.info("i").await;
        logger.warn("w").await;
        logger.error("e").await;

        assert_eq!(sink.count(), 2);
        assert_eq!(logger.stats().messages_logged, 2);
        let levels: Vec<LogLevel> = sink.messages.lock().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![LogLevel::Warn, LogLevel::Error]);
    }

    #[tokio::test]
    async fn test_message_carries_session_and_context() {
        let sink = RecordingTransport::new("sink");
        let logger = logger_with(LogLevel::Debug, vec![sink.clone()]);

        logger
            .info_with("loaded", LogContext::new().tag("page", "home"))
            .await;

        let messages = sink.messages.lock();
        assert_eq!(messages[0].session_id, "test-session");
        assert_eq!(messages[0].message, "loaded");
        assert_eq!(messages[0].context.as_ref().unwrap().tags["page"], "home");
    }

    #[tokio::test]
    async fn test_failing_transport_is_isolated() {
        let bad = RecordingTransport::failing("bad");
        let good = RecordingTransport::new("good");
        let logger = logger_with(LogLevel::Debug, vec![bad.clone(), good.clone()]);

        logger.info("hello").await;

        assert_eq!(bad.count(), 1);
        assert_eq!(good.count(), 1);
        let stats = logger.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.messages_logged, 1);
        assert!(stats.bytes_written > 0);
    }

    #[tokio::test]
    async fn test_panicking_transport_is_isolated() {
        let good = RecordingTransport::new("good");
        let logger = logger_with(LogLevel::Debug, vec![Arc::new(PanickingTransport), good.clone()]);

        logger.error("boom").await;

        assert_eq!(good.count(), 1);
        assert_eq!(logger.stats().errors, 1);
    }

    #[tokio::test]
    async fn test_closed_logger_is_a_noop() {
        let sink = RecordingTransport::new("sink");
        let logger = logger_with(LogLevel::Debug, vec![sink.clone()]);

        logger.info("before").await;
        logger.close().await;
        let stats = logger.stats();

        logger.info("after").await;

        assert!(logger.is_closed());
        assert_eq!(sink.count(), 1);
        assert_eq!(logger.stats(), stats);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let sink = RecordingTransport::new("sink");
        let logger = logger_with(LogLevel::Debug, vec![sink.clone()]);

        logger.close().await;
        logger.close().await;

        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_close_waits_for_shutdown() {
        let sink = RecordingTransport::slow_flush("sink", std::time::Duration::from_millis(100));
        let logger = Arc::new(logger_with(LogLevel::Debug, vec![sink.clone()]));

        let first = tokio::spawn({
            let logger = Arc::clone(&logger);
            async move { logger.close().await }
        });
        tokio::task::yield_now().await;

        logger.close().await;

        assert!(logger.is_closed());
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);

        logger.info("after close").await;
        assert_eq!(sink.count(), 0);
        assert_eq!(logger.stats().messages_logged, 0);

        first.await.unwrap();
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logging_during_close_is_dropped() {
        let sink = RecordingTransport::slow_flush("sink", std::time::Duration::from_millis(100));
        let logger = Arc::new(logger_with(LogLevel::Debug, vec![sink.clone()]));

        let closing = tokio::spawn({
            let logger = Arc::clone(&logger);
            async move { logger.close().await }
        });
        tokio::task::yield_now().await;

        assert!(!logger.is_closed());
        logger.warn("mid-shutdown").await;
        assert_eq!(sink.count(), 0);

        closing.await.unwrap();
        assert!(logger.is_closed());
    }

    #[tokio::test]
    async fn test_flush_skips_transports_without_flush() {
        let sink = RecordingTransport::new("sink");
        let logger = logger_with(LogLevel::Debug, vec![Arc::new(MinimalTransport), sink.clone()]);

        logger.flush().await;

        let stats = logger.stats();
        assert_eq!(stats.flush_count, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_and_remove_transports() {
        let logger = logger_with(LogLevel::Debug, Vec::new());
        logger.add_transport(RecordingTransport::new("a"));
        logger.add_transport(RecordingTransport::new("b"));
        logger.add_transport(RecordingTransport::new("a"));

        assert_eq!(logger.get_transports(), vec!["a".to_string(), "b".to_string()]);
        assert!(logger.remove_transport("a"));
        assert!(!logger.remove_transport("a"));
        assert_eq!(logger.get_transports(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_detached_log_delivers() {
        let sink = RecordingTransport::new("sink");
        let logger = Arc::new(logger_with(LogLevel::Debug, vec![sink.clone()]));

        logger
            .log_detached(LogLevel::Info, "background", None)
            .await
            .unwrap();

        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_default_session_id() {
        let logger = AsyncLogger::new(LoggerOptions::default());
        assert!(logger.session_id().starts_with("session-"));
        assert_eq!(logger.log_level(), LogLevel::Info);
    }
}
