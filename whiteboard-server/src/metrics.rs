//! Prometheus metrics for the whiteboard server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics`
//! endpoint.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const WS_CONNECTIONS_ACTIVE: &str = "whiteboard_ws_connections_active";
const OPS_PERSISTED_TOTAL: &str = "whiteboard_ops_persisted_total";
const OPS_DROPPED_TOTAL: &str = "whiteboard_ops_dropped_total";
const BROADCASTS_TOTAL: &str = "whiteboard_broadcasts_total";
const RECONCILIATION_RUNS_TOTAL: &str = "whiteboard_reconciliation_runs_total";
const RECONCILIATION_OPS: &str = "whiteboard_reconciliation_ops";
const VALIDATION_FAILURES_TOTAL: &str = "whiteboard_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Increment active WebSocket connections.
pub fn inc_ws_connections() {
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement active WebSocket connections.
pub fn dec_ws_connections() {
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record a persisted drawing operation.
pub fn record_op_persisted() {
    counter!(OPS_PERSISTED_TOTAL).increment(1);
}

/// Record a dropped operation.
///
/// # Arguments
///
/// * `reason` - "lock_unavailable" or "store_failure"
pub fn record_op_dropped(reason: &str) {
    counter!(
        OPS_DROPPED_TOTAL,
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record a fan-out broadcast.
///
/// # Arguments
///
/// * `event` - Event name (draw, clearCanvas, periodicUpdate, ...)
pub fn record_broadcast(event: &str) {
    counter!(
        BROADCASTS_TOTAL,
        "event" => event.to_string()
    )
    .increment(1);
}

/// Record one reconciliation pass and the history size it carried.
pub fn record_reconciliation(op_count: usize) {
    counter!(RECONCILIATION_RUNS_TOTAL).increment(1);
    gauge!(RECONCILIATION_OPS).set(op_count as f64);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (message_size, color, ...)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}
