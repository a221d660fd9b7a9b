//! Metric descriptions for the Prometheus exporter

use metrics::{describe_counter, describe_gauge};

/// Register help text for every pipeline metric
///
/// Called once after the exporter is installed so the `/metrics` endpoint
/// carries descriptions.
pub fn describe_metrics() {
    describe_counter!(
        "pipeline_batches_read_total",
        "Batches read from the buffer by processor workers"
    );
    describe_counter!(
        "pipeline_records_read_total",
        "Records read from the buffer by processor workers"
    );
    describe_counter!(
        "pipeline_records_processed_total",
        "Records that completed the full stage chain"
    );
    describe_counter!(
        "pipeline_sink_deliveries_total",
        "Deliveries dispatched to matched destinations"
    );
    describe_counter!(
        "pipeline_records_delivered_total",
        "Records handed to destination sinks"
    );
    describe_counter!(
        "pipeline_delivery_failures_total",
        "Deliveries that reported failure"
    );
    describe_counter!(
        "pipeline_processor_failures_total",
        "Stage executions that reported failure"
    );
    describe_gauge!("pipeline_active_workers", "Currently running processor workers");
}
