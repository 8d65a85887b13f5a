/// Prometheus metrics for the churn service and its retraining loop.
///
/// Serving metrics (prediction count and latency, HTTP traffic) are recorded
/// by the API; drift and retraining metrics are recorded by the monitoring
/// orchestrator and the quality guard.
///
/// # Example
/// ```no_run
/// use churn_sentinel::metrics::PREDICTION_REQUESTS_TOTAL;
///
/// PREDICTION_REQUESTS_TOTAL.inc();
/// ```

pub mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use std::fs;
use std::path::Path;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Serving Metrics
    // ============================================================================

    /// Total number of prediction requests
    pub static ref PREDICTION_REQUESTS_TOTAL: Counter = Counter::with_opts(
        Opts::new("prediction_requests_total", "Total number of prediction requests")
            .namespace("churn_sentinel")
    ).expect("Failed to create PREDICTION_REQUESTS_TOTAL metric");

    /// Prediction latency in seconds
    pub static ref PREDICTION_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("prediction_latency_seconds", "Prediction latency in seconds")
            .namespace("churn_sentinel")
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0])
    ).expect("Failed to create PREDICTION_LATENCY_SECONDS metric");

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace("churn_sentinel"),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace("churn_sentinel")
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Monitoring Metrics
    // ============================================================================

    /// Retraining runs by outcome
    ///
    /// Labels: outcome (no_data, drift_metric_missing, no_drift, blocked_by_cooldown, retrained)
    pub static ref RETRAIN_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("retrain_runs_total", "Total number of retraining checks by outcome")
            .namespace("churn_sentinel"),
        &["outcome"]
    ).expect("Failed to create RETRAIN_RUNS_TOTAL metric");

    /// Share of drifted columns in the latest drift report
    pub static ref DRIFT_SHARE: Gauge = Gauge::with_opts(
        Opts::new("drift_share", "Share of drifted columns in the latest drift report")
            .namespace("churn_sentinel")
    ).expect("Failed to create DRIFT_SHARE metric");

    /// Candidate models by guard decision
    ///
    /// Labels: decision (accepted, rejected)
    pub static ref MODEL_CANDIDATES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("model_candidates_total", "Total number of candidate models by guard decision")
            .namespace("churn_sentinel"),
        &["decision"]
    ).expect("Failed to create MODEL_CANDIDATES_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Application build info
    ///
    /// Labels: version, git_commit
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Application build information")
            .namespace("churn_sentinel"),
        &["version", "git_commit"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Initialize the Prometheus metrics registry
///
/// Registers all metrics with [`PROMETHEUS_REGISTRY`]. Call once at startup;
/// a second call fails with `AlreadyReg`.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    // Register serving metrics
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_LATENCY_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;

    // Register monitoring metrics
    PROMETHEUS_REGISTRY.register(Box::new(RETRAIN_RUNS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(DRIFT_SHARE.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(MODEL_CANDIDATES_TOTAL.clone()))?;

    // Register system metrics
    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

    BUILD_INFO
        .with_label_values(&[
            env!("CARGO_PKG_VERSION"),
            option_env!("GIT_COMMIT").unwrap_or("unknown"),
        ])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics
///
/// Used by the `/metrics` endpoint.
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

/// Write the current metrics to `path` in Prometheus text format
///
/// Batch commands have no `/metrics` endpoint; the file is meant for the
/// node-exporter textfile collector. Written to a temporary sibling and
/// renamed so the collector never reads a partial file.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, gather_metrics())?;
    fs::rename(&tmp, path)
}
