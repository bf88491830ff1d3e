//! Log message value passed to transports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::LogLevel;

/// Optional structured data attached to a log call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogContext {
    /// Arbitrary structured fields.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,

    /// Flat string tags for indexing.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extra field.
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A single log record, built once per accepted log call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    pub message: String,
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<LogContext>,
}

impl LogMessage {
    /// Build a message stamped with the current time.
    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        session_id: impl Into<String>,
        context: Option<LogContext>,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: Utc::now(),
            session_id: session_id.into(),
            context,
        }
    }

    /// Size of the JSON encoding, used for byte accounting.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self)
            .map(|bytes| bytes.len())
            .unwrap_or(self.message.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_grows_with_message() {
        let short = LogMessage::new(LogLevel::Info, "a", "s", None);
        let long = LogMessage::new(LogLevel::Info, "a much longer message", "s", None);
        assert!(short.encoded_len() > 0);
        assert!(long.encoded_len() > short.encoded_len());
    }

    #[test]
    fn test_serializes_camel_case() {
        let msg = LogMessage::new(
            LogLevel::Warn,
            "disk low",
            "s1",
            Some(LogContext::new().tag("host", "web-1")),
        );
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["level"], "warn");
        assert_eq!(json["context"]["tags"]["host"], "web-1");
    }
}
