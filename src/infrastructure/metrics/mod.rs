//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Search index operations by kind and outcome
//! - Index synchronization failures after commit
//! - Database pool connection gauges

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "microblog";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Search index operations by kind ("upsert", "remove", "query") and outcome
pub static INDEX_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("index_operations_total", "Total number of search index operations")
            .namespace(NAMESPACE),
        &["operation", "outcome"],
    )
    .expect("Failed to create INDEX_OPERATIONS_TOTAL metric")
});

/// Index updates that failed after the database commit succeeded
pub static INDEX_SYNC_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "index_sync_failures_total",
            "Index updates that failed after a successful commit",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create INDEX_SYNC_FAILURES_TOTAL metric")
});

/// Database connection pool stats
pub static DB_POOL_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new("db_pool_connections", "Database connection pool statistics")
            .namespace(NAMESPACE),
        &["state"], // "idle", "active", "max"
    )
    .expect("Failed to create DB_POOL_CONNECTIONS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(INDEX_OPERATIONS_TOTAL.clone()))
        .expect("Failed to register INDEX_OPERATIONS_TOTAL");
    registry
        .register(Box::new(INDEX_SYNC_FAILURES_TOTAL.clone()))
        .expect("Failed to register INDEX_SYNC_FAILURES_TOTAL");
    registry
        .register(Box::new(DB_POOL_CONNECTIONS.clone()))
        .expect("Failed to register DB_POOL_CONNECTIONS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to record a search index operation
pub fn record_index_operation(operation: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    INDEX_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Helper to count an index update lost after commit
pub fn record_index_sync_failure() {
    INDEX_SYNC_FAILURES_TOTAL.inc();
}

/// Helper to update database pool stats
pub fn update_db_pool_stats(idle: u32, active: u32, max: u32) {
    DB_POOL_CONNECTIONS
        .with_label_values(&["idle"])
        .set(idle as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["active"])
        .set(active as f64);
    DB_POOL_CONNECTIONS
        .with_label_values(&["max"])
        .set(max as f64);
}
