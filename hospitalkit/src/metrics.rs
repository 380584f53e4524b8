use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};
use std::time::Instant;

lazy_static! {
    pub static ref REPOSITORY_OPERATION_DURATION: HistogramVec = register_histogram_vec!(
        "hospital_repository_operation_duration_seconds",
        "Repository operation duration in seconds",
        &["entity", "operation", "status"]
    ).unwrap();

    pub static ref REPOSITORY_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "hospital_repository_operations_total",
        "Total number of repository operations",
        &["entity", "operation", "status"]
    ).unwrap();

    pub static ref ACTIVE_CONNECTIONS: IntGauge = register_int_gauge!(
        "hospital_active_connections",
        "Number of open ScyllaDB sessions held by connection managers"
    ).unwrap();
}

pub fn record_operation(entity: &str, operation: &str, success: bool, duration: f64) {
    let status = if success { "success" } else { "failure" };
    REPOSITORY_OPERATION_DURATION
        .with_label_values(&[entity, operation, status])
        .observe(duration);
    REPOSITORY_OPERATIONS
        .with_label_values(&[entity, operation, status])
        .inc();
}

/// Times one repository call; the outcome is recorded by `finish`.
pub struct OperationTimer {
    entity: &'static str,
    operation: &'static str,
    started: Instant,
}

impl OperationTimer {
    pub fn start(entity: &'static str, operation: &'static str) -> Self {
        Self {
            entity,
            operation,
            started: Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        record_operation(
            self.entity,
            self.operation,
            success,
            self.started.elapsed().as_secs_f64(),
        );
    }
}
