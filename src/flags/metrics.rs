//! Per-flag evaluation metrics and health report.

use std::time::Duration;

use serde::Serialize;

/// Cumulative evaluation counters for one flag key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationMetric {
    pub evaluations: u64,
    pub failures: u64,
    pub total_latency: Duration,
}

impl EvaluationMetric {
    /// Record one settled evaluation.
    pub fn record(&mut self, latency: Duration, failed: bool) {
        self.evaluations += 1;
        self.total_latency += latency;
        if failed {
            self.failures += 1;
        }
    }

    /// Failures over evaluations, `0.0` before the first evaluation.
    pub fn failure_rate(&self) -> f64 {
        if self.evaluations == 0 {
            return 0.0;
        }
        self.failures as f64 / self.evaluations as f64
    }

    /// Mean latency in milliseconds, `0.0` before the first evaluation.
    pub fn avg_latency_ms(&self) -> f64 {
        if self.evaluations == 0 {
            return 0.0;
        }
        self.total_latency.as_secs_f64() * 1000.0 / self.evaluations as f64
    }
}

/// Health classification of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagStatus {
    Healthy,
    Warning,
    Error,
}

/// Limits used to classify flags in a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportThresholds {
    /// Failure rate above which a flag is `Error`.
    pub error_failure_rate: f64,
    /// Failure rate above which a flag is `Warning`.
    pub warning_failure_rate: f64,
    /// Average latency above which a flag is `Warning`.
    pub warning_latency: Duration,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        Self {
            error_failure_rate: 0.5,
            warning_failure_rate: 0.1,
            warning_latency: Duration::from_millis(1000),
        }
    }
}

impl ReportThresholds {
    pub fn classify(&self, metric: &EvaluationMetric) -> FlagStatus {
        let failure_rate = metric.failure_rate();
        let latency_ms = self.warning_latency.as_secs_f64() * 1000.0;

        if failure_rate > self.error_failure_rate {
            FlagStatus::Error
        } else if failure_rate > self.warning_failure_rate || metric.avg_latency_ms() > latency_ms {
            FlagStatus::Warning
        } else {
            FlagStatus::Healthy
        }
    }
}

/// One row of a [`FlagReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagDetail {
    pub key: String,
    pub description: Option<String>,
    pub evaluations: u64,
    pub failure_rate: f64,
    pub avg_latency_ms: f64,
    pub status: FlagStatus,
}

/// Aggregate health of all registered and evaluated flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagReport {
    /// Number of registered flags.
    pub total_flags: usize,
    pub total_evaluations: u64,
    pub average_latency_ms: f64,
    pub overall_failure_rate: f64,
    /// One row per registered or tracked key, sorted by key.
    pub flag_details: Vec<FlagDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(evaluations: u64, failures: u64, latency_ms: u64) -> EvaluationMetric {
        EvaluationMetric {
            evaluations,
            failures,
            total_latency: Duration::from_millis(latency_ms * evaluations),
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut m = EvaluationMetric::default();
        m.record(Duration::from_millis(10), false);
        m.record(Duration::from_millis(30), true);

        assert_eq!(m.evaluations, 2);
        assert_eq!(m.failures, 1);
        assert_eq!(m.failure_rate(), 0.5);
        assert!((m.avg_latency_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_metric_is_healthy() {
        let m = EvaluationMetric::default();
        assert_eq!(m.failure_rate(), 0.0);
        assert_eq!(ReportThresholds::default().classify(&m), FlagStatus::Healthy);
    }

    #[test]
    fn test_classification() {
        let thresholds = ReportThresholds::default();
        assert_eq!(thresholds.classify(&metric(10, 0, 5)), FlagStatus::Healthy);
        assert_eq!(thresholds.classify(&metric(10, 1, 5)), FlagStatus::Healthy);
        assert_eq!(thresholds.classify(&metric(10, 2, 5)), FlagStatus::Warning);
        assert_eq!(thresholds.classify(&metric(10, 6, 5)), FlagStatus::Error);
        assert_eq!(thresholds.classify(&metric(4, 0, 1500)), FlagStatus::Warning);
    }
}
