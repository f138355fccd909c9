//! Prometheus metrics definitions.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};

/// Assets in the published snapshot.
pub static ASSETS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "iconserver_assets_total",
        "Number of assets in the published snapshot"
    )
    .unwrap()
});

/// Rebuild attempts by outcome.
pub static REBUILDS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "iconserver_rebuilds_total",
        "Total number of snapshot rebuilds",
        &["outcome"]
    )
    .unwrap()
});

/// Rebuild latency histogram.
pub static REBUILD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "iconserver_rebuild_duration_seconds",
        "Snapshot rebuild latency in seconds",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .unwrap()
});

/// Request counter.
pub static REQUEST_COUNT: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "iconserver_requests_total",
        "Total number of requests",
        &["endpoint", "status"]
    )
    .unwrap()
});

/// Initialize all metrics (call once at startup).
pub fn init_metrics() {
    // Access lazy statics to register them
    let _ = &*ASSETS_TOTAL;
    let _ = &*REBUILDS_TOTAL;
    let _ = &*REBUILD_DURATION;
    let _ = &*REQUEST_COUNT;

    tracing::debug!("Prometheus metrics initialized");
}

/// Record a rebuild outcome and the asset count now being served.
pub fn record_rebuild(success: bool, assets: usize) {
    let outcome = if success { "success" } else { "failure" };
    REBUILDS_TOTAL.with_label_values(&[outcome]).inc();
    ASSETS_TOTAL.set(i64::try_from(assets).unwrap_or(i64::MAX));
}

/// Count a served request.
pub fn record_request(endpoint: &str, status: u16) {
    REQUEST_COUNT
        .with_label_values(&[endpoint, &status.to_string()])
        .inc();
}
