//! Options and context types for flag registration and evaluation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{FlagError, Result};

/// Batch evaluation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Deadline for the whole batch, measured from the call.
    /// Flags still running at the deadline count as failed.
    pub timeout: Option<Duration>,

    /// Record per-flag evaluation metrics.
    pub track_metrics: bool,

    /// Return the first failure instead of containing it.
    pub fail_fast: bool,
}

impl EvaluateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn track_metrics(mut self, track: bool) -> Self {
        self.track_metrics = track;
        self
    }

    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.timeout
            && timeout.is_zero()
        {
            return Err(FlagError::InvalidOptions(
                "timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Metadata attached to a registered flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    pub description: Option<String>,
    /// Value type, e.g. `boolean` or `variant`. Defaults to `boolean`.
    pub flag_type: Option<String>,
    /// Names of the providers backing this flag.
    pub adapters: Vec<String>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn flag_type(mut self, flag_type: impl Into<String>) -> Self {
        self.flag_type = Some(flag_type.into());
        self
    }

    #[must_use]
    pub fn adapter(mut self, adapter: impl Into<String>) -> Self {
        self.adapters.push(adapter.into());
        self
    }
}

/// Evaluation context handed to registered flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl FlagContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
