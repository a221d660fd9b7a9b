//! LogSink - logs batch summaries via tracing

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use contracts::{Batch, PipelineError, Sink};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    written: AtomicU64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: AtomicU64::new(0),
        }
    }

    /// Records written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Sink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn output(&self, records: Batch) -> Result<(), PipelineError> {
        let total = self
            .written
            .fetch_add(records.len() as u64, Ordering::Relaxed)
            + records.len() as u64;
        info!(
            sink = %self.name,
            records = records.len(),
            total,
            "batch received"
        );
        Ok(())
    }

    async fn shutdown(&self) {
        info!(
            sink = %self.name,
            total = self.written(),
            "log sink closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use contracts::{Event, Record};

    use super::*;

    #[tokio::test]
    async fn test_log_sink_counts_records() {
        let sink = LogSink::new("test_log");
        sink.output(vec![Record::new(Event::new()), Record::new(Event::new())])
            .await
            .unwrap();
        assert_eq!(sink.written(), 2);
        sink.shutdown().await;
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
