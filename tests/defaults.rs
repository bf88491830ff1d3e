//! Process-wide default instances.
//!
//! These share state across the whole test binary, so each test uses its
//! own keys and never resets the shared registries.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::json;

use core_utils::cache::{global_cache_registry, BoundedCache, CacheConfig};
use core_utils::flags::{
    create_managed_flag, evaluate_flags, flag_manager, get_flag_report, test_all_flags,
    EvaluateOptions, FlagContext, FlagFuture, RegisterOptions,
};
use core_utils::logger::{global_logger_registry, LoggerOptions};

#[test]
fn test_global_cache_registry_is_shared() {
    let cache: BoundedCache<u32, &'static str> =
        global_cache_registry().create("defaults-cache", CacheConfig::with_capacity(4));
    cache.set(1, "one");

    let again: BoundedCache<u32, &'static str> =
        global_cache_registry().get("defaults-cache").unwrap();
    assert_eq!(again.get(&1), Some("one"));
}

#[tokio::test]
async fn test_global_logger_registry_is_shared() {
    let logger = global_logger_registry().create("defaults-logger", LoggerOptions::default());
    let again = global_logger_registry().get("defaults-logger").unwrap();
    assert!(Arc::ptr_eq(&logger, &again));

    assert!(global_logger_registry().close("defaults-logger").await);
}

#[tokio::test]
async fn test_flag_facade_delegates_to_default_manager() {
    create_managed_flag(
        "defaults-flag",
        |_ctx| async { anyhow::Ok(json!(true)) },
        RegisterOptions::new().description("Facade flag"),
    );
    assert!(flag_manager().get("defaults-flag").is_some());

    let batch: Vec<(&str, FlagFuture<bool>)> =
        vec![("defaults-batch", async { anyhow::Ok(true) }.boxed())];
    let values = evaluate_flags(batch, &EvaluateOptions::new().track_metrics(true))
        .await
        .unwrap();
    assert_eq!(values["defaults-batch"], Some(true));

    let results = test_all_flags(&FlagContext::new()).await;
    assert!(results.iter().any(|r| r.key == "defaults-flag" && !r.used_fallback));

    let report = get_flag_report();
    assert!(report.total_flags >= 1);
    assert!(report
        .flag_details
        .iter()
        .any(|d| d.key == "defaults-batch" && d.evaluations >= 1));
}
