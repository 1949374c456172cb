//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Once;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Backend Metrics
    pub static ref BACKEND_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ghpulse_backend_requests_total", "Total number of outbound backend requests"),
        &["endpoint", "outcome"]
    ).expect("metric can be created");
    pub static ref BACKEND_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "ghpulse_backend_request_duration_seconds",
            "Outbound backend request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"]
    ).expect("metric can be created");

    // Session Metrics
    pub static ref PROVIDER_SESSIONS_ACTIVE: IntGauge = IntGauge::new(
        "ghpulse_provider_sessions_active",
        "Approximate number of live provider sessions"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("ghpulse_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; registration happens on the first call only.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(BACKEND_REQUESTS_TOTAL.clone()))
            .expect("BACKEND_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(BACKEND_REQUEST_DURATION_SECONDS.clone()))
            .expect("BACKEND_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(PROVIDER_SESSIONS_ACTIVE.clone()))
            .expect("PROVIDER_SESSIONS_ACTIVE can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}

/// Record the outcome of one outbound backend call
pub fn record_backend_call(endpoint: &str, outcome: &str, elapsed: std::time::Duration) {
    BACKEND_REQUESTS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
    BACKEND_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(elapsed.as_secs_f64());
}
