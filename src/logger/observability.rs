//! Observability transport - forwards messages to an external backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::Result;
use super::{LogContext, LogLevel, LogMessage, LogTransport};

/// Component name injected into every forwarded payload.
pub const COMPONENT: &str = "core-utils";

/// Logger name injected into every forwarded payload's tags.
pub const LOGGER_TAG: &str = "AsyncLogger";

/// An external observability backend with one entry point per level.
pub trait Observability: Send + Sync {
    fn log_debug(&self, message: &str, payload: &LogContext) -> Result<()>;
    fn log_info(&self, message: &str, payload: &LogContext) -> Result<()>;
    fn log_warn(&self, message: &str, payload: &LogContext) -> Result<()>;
    fn log_error(&self, message: &str, payload: &LogContext) -> Result<()>;
}

/// Transport that forwards to an [`Observability`] backend.
///
/// Every payload gets `sessionId` and `component` in `extra`, and
/// `logger` and `sessionId` in `tags`. User fields are kept unless
/// they use one of those keys.
pub struct ObservabilityTransport {
    backend: Arc<dyn Observability>,
}

impl ObservabilityTransport {
    pub fn new(backend: Arc<dyn Observability>) -> Self {
        Self { backend }
    }

    /// Build the payload forwarded for `message`.
    pub fn payload(message: &LogMessage) -> LogContext {
        let mut payload = message.context.clone().unwrap_or_default();

        payload
            .extra
            .insert("sessionId".into(), Value::String(message.session_id.clone()));
        payload
            .extra
            .insert("component".into(), Value::String(COMPONENT.into()));

        payload.tags.insert("logger".into(), LOGGER_TAG.into());
        payload
            .tags
            .insert("sessionId".into(), message.session_id.clone());

        payload
    }
}

/// Wrap an observability backend as a log transport.
pub fn create_observability_transport(backend: Arc<dyn Observability>) -> ObservabilityTransport {
    ObservabilityTransport::new(backend)
}

#[async_trait]
impl LogTransport for ObservabilityTransport {
    fn name(&self) -> &str {
        "observability"
    }

    async fn log(&self, message: &LogMessage) -> Result<()> {
        let text = format!("[{}] {}", message.session_id, message.message);
        let payload = Self::payload(message);

        match message.level {
            LogLevel::Debug => self.backend.log_debug(&text, &payload),
            LogLevel::Info => self.backend.log_info(&text, &payload),
            LogLevel::Warn => self.backend.log_warn(&text, &payload),
            LogLevel::Error => self.backend.log_error(&text, &payload),
        }
    }
}

/// Observability backend that emits `tracing` events.
///
/// Useful as the default backend when the process already ships
/// `tracing` output to a collector.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObservability;

impl TracingObservability {
    fn fields(payload: &LogContext) -> (String, String) {
        let extra = Value::Object(payload.extra.clone()).to_string();
        let tags = serde_json::to_string(&payload.tags).unwrap_or_default();
        (extra, tags)
    }
}

impl Observability for TracingObservability {
    fn log_debug(&self, message: &str, payload: &LogContext) -> Result<()> {
        let (extra, tags) = Self::fields(payload);
        debug!(target: "core_utils::observability", %extra, %tags, "{}", message);
        Ok(())
    }

    fn log_info(&self, message: &str, payload: &LogContext) -> Result<()> {
        let (extra, tags) = Self::fields(payload);
        info!(target: "core_utils::observability", %extra, %tags, "{}", message);
        Ok(())
    }

    fn log_warn(&self, message: &str, payload: &LogContext) -> Result<()> {
        let (extra, tags) = Self::fields(payload);
        warn!(target: "core_utils::observability", %extra, %tags, "{}", message);
        Ok(())
    }

    fn log_error(&self, message: &str, payload: &LogContext) -> Result<()> {
        let (extra, tags) = Self::fields(payload);
        error!(target: "core_utils::observability", %extra, %tags, "{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(LogLevel, String, LogContext)>>,
    }

    impl Recorder {
        fn push(&self, level: LogLevel, message: &str, payload: &LogContext) -> Result<()> {
            self.calls
                .lock()
                .push((level, message.to_string(), payload.clone()));
            Ok(())
        }
    }

    impl Observability for Recorder {
        fn log_debug(&self, message: &str, payload: &LogContext) -> Result<()> {
            self.push(LogLevel::Debug, message, payload)
        }
        fn log_info(&self, message: &str, payload: &LogContext) -> Result<()> {
            self.push(LogLevel::Info, message, payload)
        }
        fn log_warn(&self, message: &str, payload: &LogContext) -> Result<()> {
            self.push(LogLevel::Warn, message, payload)
        }
        fn log_error(&self, message: &str, payload: &LogContext) -> Result<()> {
            self.push(LogLevel::Error, message, payload)
        }
    }

    #[tokio::test]
    async fn test_forwards_to_matching_level_with_injected_fields() {
        let recorder = Arc::new(Recorder::default());
        let transport = create_observability_transport(recorder.clone());

        let context = LogContext::new()
            .extra("requestId", "r-1")
            .extra("component", "user-value")
            .tag("route", "/home");
        let msg = LogMessage::new(LogLevel::Error, "render failed", "s9", Some(context));

        transport.log(&msg).await.unwrap();

        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        let (level, text, payload) = &calls[0];
        assert_eq!(*level, LogLevel::Error);
        assert_eq!(text, "[s9] render failed");
        assert_eq!(payload.extra["requestId"], "r-1");
        assert_eq!(payload.extra["sessionId"], "s9");
        assert_eq!(payload.extra["component"], COMPONENT);
        assert_eq!(payload.tags["route"], "/home");
        assert_eq!(payload.tags["logger"], LOGGER_TAG);
        assert_eq!(payload.tags["sessionId"], "s9");
    }

    #[tokio::test]
    async fn test_tracing_backend_accepts_all_levels() {
        let transport = create_observability_transport(Arc::new(TracingObservability));
        for level in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
            let msg = LogMessage::new(level, "ping", "s", None);
            assert!(transport.log(&msg).await.is_ok());
        }
    }
}
