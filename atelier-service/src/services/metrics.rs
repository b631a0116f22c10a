use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static BILLS_CREATED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static MAINTENANCE_RUNS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    let registry = Registry::new();

    let bills_counter = IntCounterVec::new(
        Opts::new("bills_created_total", "Total bills created by status"),
        &["status"],
    )
    .expect("Failed to create bills_created_total metric");

    let maintenance_counter = IntCounterVec::new(
        Opts::new(
            "maintenance_runs_total",
            "Maintenance operations run, by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create maintenance_runs_total metric");

    registry
        .register(Box::new(bills_counter.clone()))
        .expect("Failed to register bills_created_total");
    registry
        .register(Box::new(maintenance_counter.clone()))
        .expect("Failed to register maintenance_runs_total");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    BILLS_CREATED_TOTAL
        .set(bills_counter)
        .expect("Failed to set bills_created_total");
    MAINTENANCE_RUNS_TOTAL
        .set(maintenance_counter)
        .expect("Failed to set maintenance_runs_total");
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record a created bill by its payment status.
pub fn record_bill_created(status: &str) {
    if let Some(counter) = BILLS_CREATED_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record a maintenance operation run and whether it fully succeeded.
pub fn record_maintenance_run(operation: &str, success: bool) {
    if let Some(counter) = MAINTENANCE_RUNS_TOTAL.get() {
        let outcome = if success { "success" } else { "partial_failure" };
        counter.with_label_values(&[operation, outcome]).inc();
    }
}
