use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

use crate::errors::ServiceError;

// Prometheus metrics (default registry)
pub static BACKEND_READS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "catalog_store_backend_reads_total",
        "Total catalog reads issued to the property backend"
    )
    .expect("register backend_reads_total")
});

pub static BACKEND_WRITES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "catalog_store_backend_writes_total",
        "Total catalog writes accepted by the property backend"
    )
    .expect("register backend_writes_total")
});

pub static REJECTED_WRITES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "catalog_store_rejected_writes_total",
        "Total catalog writes rejected for exceeding the size bound"
    )
    .expect("register rejected_writes_total")
});

pub static SOFT_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "catalog_store_soft_failures_total",
        "Total operations that returned a default value after an error",
        &["op", "kind"]
    )
    .expect("register soft_failures_total")
});

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServiceError::Backend(format!("metrics encode error: {e}")))?;
    String::from_utf8(buffer).map_err(|e| ServiceError::Backend(format!("metrics encode error: {e}")))
}
