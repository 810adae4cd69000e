//! Observability infrastructure for the inference service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcomes by label and error kind, artifact info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, register_int_gauge,
    GaugeVec, Histogram, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServingMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ServingMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    artifacts_loaded: IntGauge,
    artifact_version_info: GaugeVec,
}

impl ServingMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "wellness_prediction_latency_seconds",
                "Time spent transforming, classifying and resolving one request",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "wellness_predictions_total",
                "Predictions served, by wellness label",
                &["label"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "wellness_prediction_errors_total",
                "Rejected or failed prediction requests, by error kind",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            artifacts_loaded: register_int_gauge!(
                "wellness_artifacts_loaded",
                "1 when the artifact bundle is loaded and serving, 0 otherwise"
            )
            .expect("Failed to register artifacts_loaded"),

            artifact_version_info: register_gauge_vec!(
                "wellness_artifact_version_info",
                "Information about the loaded artifact bundle",
                &["version", "classifier"]
            )
            .expect("Failed to register artifact_version_info"),
        }
    }
}

/// Serving metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct ServingMetrics {
    _private: (),
}

impl Default for ServingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServingMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServingMetricsInner {
        GLOBAL_METRICS.get_or_init(ServingMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, label: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[label])
            .inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn set_artifacts_loaded(&self, loaded: bool) {
        self.inner().artifacts_loaded.set(i64::from(loaded));
    }

    /// Update artifact version info
    pub fn set_artifact_version(&self, version: &str, classifier: &str) {
        self.inner().artifact_version_info.reset();
        self.inner()
            .artifact_version_info
            .with_label_values(&[version, classifier])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Emits event-tagged records for startup, artifact loading and prediction
/// outcomes. Raw telemetry values are never logged.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, artifact_dir: &str) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            artifact_dir = %artifact_dir,
            "Wellness inference service starting"
        );
    }

    pub fn log_artifacts_loaded(
        &self,
        artifact_version: &str,
        classifier: &str,
        labels: usize,
        departments: usize,
    ) {
        info!(
            event = "artifacts_loaded",
            instance = %self.instance,
            artifact_version = %artifact_version,
            classifier = %classifier,
            labels = labels,
            departments = departments,
            "Artifact bundle loaded"
        );
    }

    pub fn log_artifact_load_failed(&self, reason: &str) {
        error!(
            event = "artifact_load_failed",
            instance = %self.instance,
            reason = %reason,
            "Failed to load artifact bundle; refusing to serve"
        );
    }

    pub fn log_prediction(
        &self,
        department: &str,
        wellness_label: &str,
        resources: usize,
        latency_us: u64,
    ) {
        info!(
            event = "prediction_served",
            instance = %self.instance,
            department = %department,
            wellness_label = %wellness_label,
            resources = resources,
            latency_us = latency_us,
            "Served wellness prediction"
        );
    }

    /// Log a request that ended in a failed state. Internal prediction
    /// failures are logged as errors; everything else is expected traffic.
    pub fn log_rejection(&self, kind: &str, stage: &str, detail: &str) {
        match kind {
            "prediction_failed" => {
                error!(
                    event = "prediction_rejected",
                    instance = %self.instance,
                    kind = %kind,
                    stage = %stage,
                    detail = %detail,
                    "Unexpected prediction failure"
                );
            }
            "service_unavailable" => {
                warn!(
                    event = "prediction_rejected",
                    instance = %self.instance,
                    kind = %kind,
                    stage = %stage,
                    detail = %detail,
                    "Prediction requested while artifacts are unavailable"
                );
            }
            _ => {
                info!(
                    event = "prediction_rejected",
                    instance = %self.instance,
                    kind = %kind,
                    stage = %stage,
                    detail = %detail,
                    "Rejected prediction request"
                );
            }
        }
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Wellness inference service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serving_metrics_creation() {
        let metrics = ServingMetrics::new();

        metrics.observe_prediction_latency(0.0002);
        metrics.inc_predictions("Stressed");
        metrics.inc_prediction_errors("invalid_input");
        metrics.set_artifacts_loaded(true);
        metrics.set_artifact_version("2024-05-01", "forest");
    }

    #[test]
    fn test_metrics_exposed_in_registry() {
        let metrics = ServingMetrics::new();
        metrics.inc_predictions("Healthy");

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "wellness_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }
}
