//! Run statistics reporting.

use std::time::Duration;

use engine::MetricsSnapshot;

/// Summary of a pipeline run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Pipeline name
    pub pipeline: String,

    /// Total duration of the run
    pub duration: Duration,

    /// Number of processor workers
    pub workers: usize,

    /// Number of configured sinks
    pub sinks: usize,

    /// Final metrics snapshot
    pub metrics: MetricsSnapshot,
}

impl RunSummary {
    /// Records per second over the run
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.records_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print a human-readable summary
    pub fn print_summary(&self) {
        println!();
        println!("Pipeline run summary: {}", self.pipeline);
        println!("  duration            {:.2}s", self.duration.as_secs_f64());
        println!("  workers             {}", self.workers);
        println!("  sinks               {}", self.sinks);
        println!("  batches read        {}", self.metrics.batches_read);
        println!("  records read        {}", self.metrics.records_read);
        println!("  records processed   {}", self.metrics.records_processed);
        println!("  deliveries          {}", self.metrics.deliveries);
        println!("  records delivered   {}", self.metrics.records_delivered);
        println!("  delivery failures   {}", self.metrics.delivery_failures);
        println!("  processor failures  {}", self.metrics.processor_failures);
        println!("  throughput          {:.1} records/s", self.throughput());
        println!();
    }
}
