//! Pipeline metrics for observability
//!
//! Atomics back the snapshot used by accessors and the run summary; the same
//! recording calls emit `metrics` crate counters/gauges for the exporter.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use metrics::{counter, gauge};

const METRIC_BATCHES_READ: &str = "pipeline_batches_read_total";
const METRIC_RECORDS_READ: &str = "pipeline_records_read_total";
const METRIC_RECORDS_PROCESSED: &str = "pipeline_records_processed_total";
const METRIC_DELIVERIES: &str = "pipeline_sink_deliveries_total";
const METRIC_RECORDS_DELIVERED: &str = "pipeline_records_delivered_total";
const METRIC_DELIVERY_FAILURES: &str = "pipeline_delivery_failures_total";
const METRIC_PROCESSOR_FAILURES: &str = "pipeline_processor_failures_total";
const METRIC_ACTIVE_WORKERS: &str = "pipeline_active_workers";

/// Metrics for a single pipeline
#[derive(Debug)]
pub struct PipelineMetrics {
    pipeline: String,
    batches_read: AtomicU64,
    records_read: AtomicU64,
    records_processed: AtomicU64,
    deliveries: AtomicU64,
    records_delivered: AtomicU64,
    delivery_failures: AtomicU64,
    processor_failures: AtomicU64,
    active_workers: AtomicUsize,
}

impl PipelineMetrics {
    /// Create a metrics instance labeled with the pipeline name
    pub fn new(pipeline: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            batches_read: AtomicU64::new(0),
            records_read: AtomicU64::new(0),
            records_processed: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            records_delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            processor_failures: AtomicU64::new(0),
            active_workers: AtomicUsize::new(0),
        }
    }

    /// Record one buffer read returning `records` records
    pub fn record_batch_read(&self, records: usize) {
        self.batches_read.fetch_add(1, Ordering::Relaxed);
        self.records_read.fetch_add(records as u64, Ordering::Relaxed);
        counter!(METRIC_BATCHES_READ, "pipeline" => self.pipeline.clone()).increment(1);
        counter!(METRIC_RECORDS_READ, "pipeline" => self.pipeline.clone())
            .increment(records as u64);
    }

    /// Record records that completed the full stage chain
    pub fn record_records_processed(&self, records: usize) {
        self.records_processed
            .fetch_add(records as u64, Ordering::Relaxed);
        counter!(METRIC_RECORDS_PROCESSED, "pipeline" => self.pipeline.clone())
            .increment(records as u64);
    }

    /// Record one delivery dispatched to a matched destination
    pub fn record_delivery(&self, sink: &str, records: usize) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
        self.records_delivered
            .fetch_add(records as u64, Ordering::Relaxed);
        counter!(METRIC_DELIVERIES, "pipeline" => self.pipeline.clone(), "sink" => sink.to_string())
            .increment(1);
        counter!(METRIC_RECORDS_DELIVERED, "pipeline" => self.pipeline.clone(), "sink" => sink.to_string())
            .increment(records as u64);
    }

    /// Record a failed delivery
    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_DELIVERY_FAILURES, "pipeline" => self.pipeline.clone()).increment(1);
    }

    /// Record a failed stage execution
    pub fn record_processor_failure(&self) {
        self.processor_failures.fetch_add(1, Ordering::Relaxed);
        counter!(METRIC_PROCESSOR_FAILURES, "pipeline" => self.pipeline.clone()).increment(1);
    }

    /// Record a worker entering its loop
    pub fn worker_started(&self) {
        let active = self.active_workers.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!(METRIC_ACTIVE_WORKERS, "pipeline" => self.pipeline.clone()).set(active as f64);
    }

    /// Record a worker exiting
    pub fn worker_stopped(&self) {
        let active = self
            .active_workers
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        gauge!(METRIC_ACTIVE_WORKERS, "pipeline" => self.pipeline.clone()).set(active as f64);
    }

    /// Currently running workers
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_read: self.batches_read.load(Ordering::Relaxed),
            records_read: self.records_read.load(Ordering::Relaxed),
            records_processed: self.records_processed.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            processor_failures: self.processor_failures.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of pipeline metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub batches_read: u64,
    pub records_read: u64,
    pub records_processed: u64,
    pub deliveries: u64,
    pub records_delivered: u64,
    pub delivery_failures: u64,
    pub processor_failures: u64,
    pub active_workers: usize,
}
