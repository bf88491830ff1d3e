//! Flags module - Feature-flag registry with concurrent evaluation.
//!
//! ## Architecture
//!
//! - `FlagManager` - Registered flags, batch evaluation, metrics, reports
//! - `EvaluateOptions` - `timeout`, `track_metrics` and `fail_fast` knobs
//! - `FlagReport` - Per-flag health classified by `ReportThresholds`
//! - Free functions (`evaluate_flags`, `get_flag_report`, ...) delegate to
//!   the process-wide `flag_manager()`
//!
//! ## Usage
//!
//! ```rust
//! use core_utils::flags::{EvaluateOptions, FlagContext, FlagManager, RegisterOptions};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let flags = FlagManager::new();
//! flags.register(
//!     "new-checkout",
//!     |ctx: FlagContext| async move { anyhow::Ok(json!(ctx.user_id.is_some())) },
//!     RegisterOptions::new().description("New checkout flow"),
//! );
//!
//! let values = flags
//!     .evaluate_registered(&FlagContext::new().user("u-1"), &EvaluateOptions::new().track_metrics(true))
//!     .await
//!     .unwrap();
//! assert_eq!(values["new-checkout"], Some(json!(true)));
//! # });
//! ```

mod error;
mod facade;
mod manager;
mod metrics;
mod options;

pub use error::{FlagError, Result};
pub use facade::{create_managed_flag, evaluate_flags, flag_manager, get_flag_report, test_all_flags};
pub use manager::{FlagFuture, FlagManager, FlagManagerConfig, FlagTestResult, RegisteredFlag};
pub use metrics::{EvaluationMetric, FlagDetail, FlagReport, FlagStatus, ReportThresholds};
pub use options::{EvaluateOptions, FlagContext, RegisterOptions};
