//! Process-wide flag manager and free-function shortcuts.

use std::collections::HashMap;
use std::future::Future;

use once_cell::sync::Lazy;
use serde_json::Value;

use super::error::Result;
use super::manager::{FlagManager, FlagTestResult, RegisteredFlag};
use super::metrics::FlagReport;
use super::options::{EvaluateOptions, FlagContext, RegisterOptions};

static FLAG_MANAGER: Lazy<FlagManager> = Lazy::new(FlagManager::new);

/// The default manager used by the functions in this module.
pub fn flag_manager() -> &'static FlagManager {
    &FLAG_MANAGER
}

/// Register a flag on the default manager.
pub fn create_managed_flag<F, Fut>(
    key: impl Into<String>,
    evaluate: F,
    options: RegisterOptions,
) -> RegisteredFlag
where
    F: Fn(FlagContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    flag_manager().register(key, evaluate, options)
}

/// Evaluate a batch on the default manager.
pub async fn evaluate_flags<T, K, Fut>(
    flags: impl IntoIterator<Item = (K, Fut)>,
    options: &EvaluateOptions,
) -> Result<HashMap<String, Option<T>>>
where
    T: Send + 'static,
    K: Into<String>,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    flag_manager().evaluate_flags(flags, options).await
}

/// Report for the default manager.
pub fn get_flag_report() -> FlagReport {
    flag_manager().generate_report()
}

/// Run every flag registered on the default manager.
pub async fn test_all_flags(context: &FlagContext) -> Vec<FlagTestResult> {
    flag_manager().test_flags(context).await
}
