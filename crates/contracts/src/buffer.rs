//! Buffer trait - bounded hand-off between source and processing
//!
//! The buffer is the single shared-mutation point between the source task and
//! all processor workers, and must provide its own internal synchronization.

use std::time::Duration;

use crate::{Batch, EventRecord, PipelineError};

/// Bounded, thread-safe holding area between the source and processing stages
#[async_trait::async_trait]
pub trait Buffer: Send + Sync {
    /// Write a single record
    ///
    /// # Errors
    /// Returns a write error when the buffer can no longer accept records
    /// (e.g. it has been closed).
    async fn write(&self, record: EventRecord) -> Result<(), PipelineError>;

    /// Write a collection of records in order
    async fn write_all(&self, records: Vec<EventRecord>) -> Result<(), PipelineError> {
        for record in records {
            self.write(record).await?;
        }
        Ok(())
    }

    /// Read a batch of records, waiting up to `timeout`
    ///
    /// A timed-out read returns an empty batch; it is not an error. Batch
    /// boundaries are determined by the buffer's own batching policy.
    async fn read_batch(&self, timeout: Duration) -> Batch;
}
