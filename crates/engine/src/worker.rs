//! ProcessWorker - stage execution loop
//!
//! Each worker owns one stage sequence instance and loops: read a batch from
//! the buffer, run the stages in order, publish the result, await the
//! deliveries. Stop is advisory and takes effect at the next iteration
//! boundary; the drain path gives stateful processors a chance to flush.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use contracts::{Batch, PipelineError, WorkerStageSequence};

use crate::future_helper;
use crate::pipeline::Pipeline;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One processor worker bound to a single stage sequence instance
pub(crate) struct ProcessWorker {
    id: usize,
    pipeline: Pipeline,
    stages: WorkerStageSequence,
}

impl ProcessWorker {
    pub(crate) fn new(id: usize, pipeline: Pipeline, stages: WorkerStageSequence) -> Self {
        Self {
            id,
            pipeline,
            stages,
        }
    }

    /// Run until shutdown is requested or a fatal failure occurs
    pub(crate) async fn run(mut self) {
        debug!(
            pipeline = %self.pipeline.name(),
            worker = self.id,
            stages = self.stages.len(),
            "process worker started"
        );
        self.pipeline.metrics().worker_started();

        let read_timeout = self.pipeline.timeouts().read_batch;

        while !self.pipeline.is_stop_requested() {
            let batch = self.pipeline.buffer().read_batch(read_timeout).await;
            if batch.is_empty() {
                // timed-out read, not an error
                continue;
            }
            self.pipeline.metrics().record_batch_read(batch.len());

            let records = match self.apply_stages(batch) {
                Ok(records) => records,
                Err(e) => {
                    error!(
                        pipeline = %self.pipeline.name(),
                        worker = self.id,
                        error = %e,
                        "stage execution failed, shutting down pipeline"
                    );
                    self.pipeline.metrics().record_processor_failure();
                    self.pipeline.initiate_shutdown();
                    break;
                }
            };

            if records.is_empty() {
                continue;
            }

            let handles = self.pipeline.publish_to_sinks(records);
            if let Err(e) = future_helper::await_all(handles).await {
                error!(
                    pipeline = %self.pipeline.name(),
                    worker = self.id,
                    error = %e,
                    "sink delivery failed, shutting down pipeline"
                );
                self.pipeline.metrics().record_delivery_failure();
                self.pipeline.initiate_shutdown();
                break;
            }
        }

        self.drain().await;
        self.pipeline.metrics().worker_stopped();
        debug!(pipeline = %self.pipeline.name(), worker = self.id, "process worker stopped");
    }

    /// Execute stages strictly in order; the output of one stage becomes the
    /// input of the next.
    fn apply_stages(&mut self, batch: Batch) -> Result<Batch, PipelineError> {
        let mut records = batch;
        for stage in self.stages.stages_mut() {
            for processor in stage.processors_mut() {
                records = processor.execute(records)?;
            }
        }
        self.pipeline.metrics().record_records_processed(records.len());
        Ok(records)
    }

    /// Shutdown protocol for the stages this worker owns: prepare, poll
    /// readiness bounded by the processor-shutdown timeout, then shut down
    /// each processor exactly once.
    async fn drain(&mut self) {
        for stage in self.stages.stages_mut() {
            for processor in stage.processors_mut() {
                processor.prepare_for_shutdown();
            }
        }

        let deadline = Instant::now() + self.pipeline.timeouts().processor_shutdown;
        loop {
            let pending = self
                .stages
                .stages()
                .iter()
                .flat_map(|stage| stage.processors())
                .filter(|processor| !processor.is_ready_for_shutdown())
                .count();
            if pending == 0 {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    pipeline = %self.pipeline.name(),
                    worker = self.id,
                    pending,
                    "processors not ready for shutdown, proceeding"
                );
                break;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        for stage in self.stages.stages_mut() {
            for processor in stage.processors_mut() {
                processor.shutdown();
            }
        }
    }
}
