//! Observability infrastructure for the SAF miles predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction counts, errors, dropped log records, model info)
//! - Structured JSON logging with tracing

use crate::classifier::ModelInfo;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions: IntCounter,
    prediction_errors: IntCounterVec,
    decision_log_dropped: IntCounter,
    model_info: GaugeVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "saf_predictor_prediction_latency_seconds",
                "Time spent scoring one passenger offer",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions: register_int_counter!(
                "saf_predictor_predictions_total",
                "Total number of offers scored successfully"
            )
            .expect("Failed to register predictions_total"),

            prediction_errors: register_int_counter_vec!(
                "saf_predictor_prediction_errors_total",
                "Total number of offers that could not be scored",
                &["kind"]
            )
            .expect("Failed to register prediction_errors_total"),

            decision_log_dropped: register_int_counter!(
                "saf_predictor_decision_log_dropped_total",
                "Decision log records dropped because the writer could not keep up"
            )
            .expect("Failed to register decision_log_dropped_total"),

            model_info: register_gauge_vec!(
                "saf_predictor_model_info",
                "Information about the loaded classifier",
                &["format", "sha256"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide metrics; clones share the same series
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (registers global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions.inc();
    }

    pub fn inc_prediction_errors(&self, kind: &str) {
        self.inner().prediction_errors.with_label_values(&[kind]).inc();
    }

    pub fn inc_decision_log_dropped(&self) {
        self.inner().decision_log_dropped.inc();
    }

    pub fn set_model_info(&self, format: &str, sha256: &str) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, sha256])
            .set(1.0);
    }
}

/// Structured logger for service events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            addr = %addr,
            "SAF miles predictor started"
        );
    }

    pub fn log_model_loaded(&self, model: &ModelInfo) {
        info!(
            event = "model_loaded",
            service = %self.service,
            path = %model.path,
            format = model.format.as_str(),
            sha256 = %model.sha256,
            size_bytes = model.size_bytes,
            "Classifier ready"
        );
    }

    /// Warn when serving and training derive SAF miles differently
    pub fn log_feature_drift(&self, serving_scarcity: f64, training_scarcity: f64) {
        if serving_scarcity != training_scarcity {
            warn!(
                event = "feature_definition_mismatch",
                service = %self.service,
                serving_scarcity_rate = serving_scarcity,
                training_scarcity_rate = training_scarcity,
                "SAF miles are served with a different scarcity rate than the classifier was trained on"
            );
        }
    }

    pub fn log_prediction(
        &self,
        tier: &str,
        route: &str,
        premium: f64,
        saf_miles: u64,
        probability: f64,
        elapsed_us: u128,
    ) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            tier = %tier,
            route = %route,
            premium = premium,
            saf_miles = saf_miles,
            probability = probability,
            elapsed_us = elapsed_us as u64,
            "Scored SAF offer"
        );
    }

    pub fn log_prediction_failure(&self, kind: &str, error: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            kind = %kind,
            error = %error,
            "Could not score SAF offer"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "SAF miles predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_record() {
        let metrics = EngineMetrics::new();
        metrics.observe_prediction_latency(0.0002);
        metrics.inc_predictions();
        metrics.inc_prediction_errors("unknown_category_value");
        metrics.inc_decision_log_dropped();
        metrics.set_model_info("tree_ensemble", "abc123");

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "saf_predictor_predictions_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("saf-server");
        assert_eq!(logger.service, "saf-server");
    }

    #[test]
    fn test_log_model_loaded_accepts_model_info() {
        let logger = StructuredLogger::new("saf-server");
        logger.log_model_loaded(&ModelInfo {
            path: "saf_model.json".to_string(),
            format: crate::classifier::ModelFormat::TreeEnsemble,
            sha256: "abc123".to_string(),
            size_bytes: 2048,
        });
    }
}
