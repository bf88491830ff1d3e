//! Flag manager - registry, batch evaluation and metrics.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{join_all, BoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::{FlagError, Result};
use super::metrics::{EvaluationMetric, FlagDetail, FlagReport, ReportThresholds};
use super::options::{EvaluateOptions, FlagContext, RegisterOptions};

/// A boxed flag evaluation, ready to be spawned.
pub type FlagFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

type EvaluateFn = Arc<dyn Fn(FlagContext) -> FlagFuture<Value> + Send + Sync>;

/// A flag stored in the manager.
#[derive(Clone)]
pub struct RegisteredFlag {
    pub key: String,
    pub description: Option<String>,
    pub flag_type: String,
    pub adapters: Vec<String>,
    evaluate: EvaluateFn,
}

impl RegisteredFlag {
    /// Start an evaluation against `context`.
    pub fn evaluate(&self, context: FlagContext) -> FlagFuture<Value> {
        (self.evaluate)(context)
    }
}

impl std::fmt::Debug for RegisteredFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFlag")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("flag_type", &self.flag_type)
            .field("adapters", &self.adapters)
            .finish_non_exhaustive()
    }
}

/// Outcome of evaluating one registered flag in [`FlagManager::test_flags`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagTestResult {
    pub key: String,
    pub result: Option<Value>,
    pub latency: Duration,
    pub used_fallback: bool,
    pub error: Option<String>,
}

/// Manager configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagManagerConfig {
    pub thresholds: ReportThresholds,

    /// Per-flag limit for [`FlagManager::test_flags`]. `None` waits forever.
    pub test_timeout: Option<Duration>,
}

impl Default for FlagManagerConfig {
    fn default() -> Self {
        Self {
            thresholds: ReportThresholds::default(),
            test_timeout: Some(Duration::from_millis(1_000)),
        }
    }
}

impl FlagManagerConfig {
    #[must_use]
    pub fn thresholds(mut self, thresholds: ReportThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn test_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.test_timeout = timeout;
        self
    }
}

/// Result of one flag within a batch.
struct Settled<T> {
    key: String,
    latency: Duration,
    result: Result<T>,
}

/// Registry of named flags with concurrent, time-bounded evaluation.
///
/// Evaluations run as tokio tasks, so every method that evaluates must be
/// called from within a tokio runtime. Tasks that lose a timeout race or
/// are still running when a fail-fast batch returns are detached, not
/// cancelled.
pub struct FlagManager {
    flags: RwLock<BTreeMap<String, RegisteredFlag>>,
    metrics: DashMap<String, EvaluationMetric>,
    config: FlagManagerConfig,
}

impl FlagManager {
    pub fn new() -> Self {
        Self::with_config(FlagManagerConfig::default())
    }

    pub fn with_config(config: FlagManagerConfig) -> Self {
        Self {
            flags: RwLock::new(BTreeMap::new()),
            metrics: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &FlagManagerConfig {
        &self.config
    }

    /// Register a flag. Re-registering a key replaces the previous flag.
    pub fn register<F, Fut>(
        &self,
        key: impl Into<String>,
        evaluate: F,
        options: RegisterOptions,
    ) -> RegisteredFlag
    where
        F: Fn(FlagContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let key = key.into();
        let flag = RegisteredFlag {
            key: key.clone(),
            description: options.description,
            flag_type: options.flag_type.unwrap_or_else(|| "boolean".to_string()),
            adapters: options.adapters,
            evaluate: Arc::new(move |context| evaluate(context).boxed()),
        };

        let replaced = self.flags.write().insert(key.clone(), flag.clone()).is_some();
        if replaced {
            warn!("Flag '{}' re-registered, previous definition replaced", key);
        } else {
            info!(
                "Registered flag '{}' (type: {}, adapters: {:?})",
                key, flag.flag_type, flag.adapters
            );
        }

        flag
    }

    pub fn get(&self, key: &str) -> Option<RegisteredFlag> {
        self.flags.read().get(key).cloned()
    }

    /// Registered keys, sorted.
    pub fn flag_keys(&self) -> Vec<String> {
        self.flags.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.flags.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.read().is_empty()
    }

    /// Evaluate a batch of flags concurrently.
    ///
    /// Every future is spawned before any is awaited. The result has exactly
    /// the input keys; failed or timed-out flags map to `None`. With
    /// `fail_fast`, the first failure to settle is returned instead.
    pub async fn evaluate_flags<T, K, Fut>(
        &self,
        flags: impl IntoIterator<Item = (K, Fut)>,
        options: &EvaluateOptions,
    ) -> Result<HashMap<String, Option<T>>>
    where
        T: Send + 'static,
        K: Into<String>,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        options.validate()?;

        let flags: Vec<(String, Fut)> = flags.into_iter().map(|(k, f)| (k.into(), f)).collect();
        let mut seen = HashSet::with_capacity(flags.len());
        for (key, _) in &flags {
            if !seen.insert(key.as_str()) {
                return Err(FlagError::DuplicateKey(key.clone()));
            }
        }

        let started = Instant::now();
        // A deadline past the end of the clock is no deadline at all
        let deadline = options
            .timeout
            .and_then(|timeout| started.checked_add(timeout).map(|at| (at, timeout)));

        let mut results: HashMap<String, Option<T>> = HashMap::with_capacity(flags.len());
        let mut pending: FuturesUnordered<_> = flags
            .into_iter()
            .map(|(key, flag)| {
                results.insert(key.clone(), None);
                settle(key, tokio::spawn(flag), started, deadline)
            })
            .collect();

        while let Some(settled) = pending.next().await {
            if options.track_metrics {
                self.record(&settled.key, settled.latency, settled.result.is_err());
            }

            match settled.result {
                Ok(value) => {
                    results.insert(settled.key, Some(value));
                }
                Err(err) if options.fail_fast => {
                    debug!("Fail-fast batch aborted by flag '{}'", settled.key);
                    return Err(err);
                }
                Err(err) => {
                    debug!("Flag '{}' failed, resolved to None: {}", settled.key, err);
                }
            }
        }

        Ok(results)
    }

    /// Evaluate every registered flag against `context` as one batch.
    pub async fn evaluate_registered(
        &self,
        context: &FlagContext,
        options: &EvaluateOptions,
    ) -> Result<HashMap<String, Option<Value>>> {
        let batch: Vec<(String, FlagFuture<Value>)> = self
            .flags
            .read()
            .values()
            .map(|flag| (flag.key.clone(), flag.evaluate(context.clone())))
            .collect();

        self.evaluate_flags(batch, options).await
    }

    /// Evaluate every registered flag and report each outcome.
    ///
    /// Never fails: evaluation errors are captured per flag. Each flag is
    /// bounded by [`FlagManagerConfig::test_timeout`]; a flag that overruns
    /// is detached and reported as a timeout.
    pub async fn test_flags(&self, context: &FlagContext) -> Vec<FlagTestResult> {
        let flags: Vec<RegisteredFlag> = self.flags.read().values().cloned().collect();
        let test_timeout = self.config.test_timeout;

        let runs = flags.into_iter().map(|flag| {
            let started = Instant::now();
            let handle = tokio::spawn(flag.evaluate(context.clone()));
            async move {
                let outcome = match test_timeout {
                    Some(timeout) => tokio::time::timeout(timeout, handle)
                        .await
                        .map_err(|_| FlagError::Timeout {
                            key: flag.key.clone(),
                            timeout,
                        }),
                    None => Ok(handle.await),
                };
                let latency = started.elapsed();
                let (result, error) = match outcome {
                    Ok(Ok(Ok(value))) => (Some(value), None),
                    Ok(Ok(Err(err))) => (None, Some(format!("{err:#}"))),
                    Ok(Err(_)) => (None, Some(FlagError::Panicked(flag.key.clone()).to_string())),
                    Err(timed_out) => (None, Some(timed_out.to_string())),
                };

                FlagTestResult {
                    used_fallback: error.is_some(),
                    key: flag.key,
                    result,
                    latency,
                    error,
                }
            }
        });

        join_all(runs).await
    }

    /// Build a health report from registered flags and recorded metrics.
    pub fn generate_report(&self) -> FlagReport {
        let flags = self.flags.read();

        let mut keys: BTreeSet<String> = flags.keys().cloned().collect();
        keys.extend(self.metrics.iter().map(|entry| entry.key().clone()));

        let mut totals = EvaluationMetric::default();
        let flag_details = keys
            .into_iter()
            .map(|key| {
                let metric = self.metrics(&key).unwrap_or_default();
                totals.evaluations += metric.evaluations;
                totals.failures += metric.failures;
                totals.total_latency += metric.total_latency;

                FlagDetail {
                    description: flags.get(&key).and_then(|flag| flag.description.clone()),
                    evaluations: metric.evaluations,
                    failure_rate: metric.failure_rate(),
                    avg_latency_ms: metric.avg_latency_ms(),
                    status: self.config.thresholds.classify(&metric),
                    key,
                }
            })
            .collect();

        FlagReport {
            total_flags: flags.len(),
            total_evaluations: totals.evaluations,
            average_latency_ms: totals.avg_latency_ms(),
            overall_failure_rate: totals.failure_rate(),
            flag_details,
        }
    }

    /// Metric snapshot for one key.
    pub fn metrics(&self, key: &str) -> Option<EvaluationMetric> {
        self.metrics.get(key).map(|entry| *entry)
    }

    pub fn reset_metrics(&self) {
        self.metrics.clear();
    }

    /// Drop all registered flags and metrics.
    pub fn reset_for_tests(&self) {
        self.flags.write().clear();
        self.metrics.clear();
    }

    fn record(&self, key: &str, latency: Duration, failed: bool) {
        self.metrics
            .entry(key.to_string())
            .or_default()
            .record(latency, failed);
    }
}

impl Default for FlagManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlagManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagManager")
            .field("flags", &self.flag_keys())
            .field("tracked_keys", &self.metrics.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Wait for one spawned flag, racing it against the batch deadline.
///
/// Dropping the `JoinHandle` on timeout detaches the task; whatever it
/// eventually returns is discarded.
async fn settle<T>(
    key: String,
    handle: JoinHandle<anyhow::Result<T>>,
    started: Instant,
    deadline: Option<(Instant, Duration)>,
) -> Settled<T> {
    let joined = match deadline {
        Some((at, timeout)) => match tokio::time::timeout_at(at, handle).await {
            Ok(joined) => joined,
            Err(_) => {
                return Settled {
                    latency: started.elapsed(),
                    result: Err(FlagError::Timeout {
                        key: key.clone(),
                        timeout,
                    }),
                    key,
                };
            }
        },
        None => handle.await,
    };

    let result = match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(FlagError::Evaluation {
            key: key.clone(),
            source,
        }),
        Err(_) => Err(FlagError::Panicked(key.clone())),
    };

    Settled {
        latency: started.elapsed(),
        result,
        key,
    }
}
