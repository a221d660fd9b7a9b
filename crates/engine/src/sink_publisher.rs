//! Sink publisher - asynchronous delivery with completion handles
//!
//! Invokes a destination's output operation on its own task and hands back a
//! completion handle, so the publishing worker is never blocked by a slow
//! sink and the pipeline can still wait for in-flight deliveries before
//! declaring shutdown complete.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::trace;

use contracts::{DataFlowComponent, EventRecord, PipelineError};

/// Completion handle for one in-flight sink delivery
///
/// Resolves to success or the delivery failure; carries no payload.
pub struct DeliveryHandle {
    sink_name: String,
    handle: JoinHandle<Result<(), PipelineError>>,
}

impl DeliveryHandle {
    /// Name of the sink this delivery targets
    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    /// Wait for the delivery to resolve
    ///
    /// # Errors
    /// Returns the sink's delivery error, or a `SinkWrite` error when the
    /// delivery task itself failed (e.g. panicked).
    pub async fn wait(self) -> Result<(), PipelineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::sink_write(
                self.sink_name,
                format!("delivery task failed: {e}"),
            )),
        }
    }
}

impl std::fmt::Debug for DeliveryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryHandle")
            .field("sink", &self.sink_name)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}

/// Dispatches batches to destination sinks
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkPublisher;

impl SinkPublisher {
    /// Invoke the destination's output operation asynchronously
    ///
    /// The call is fired on its own task; the returned handle resolves when
    /// the sink reports completion.
    pub fn publish(destination: &DataFlowComponent, records: Vec<EventRecord>) -> DeliveryHandle {
        let sink = Arc::clone(destination.component());
        let sink_name = sink.name().to_string();

        trace!(sink = %sink_name, records = records.len(), "dispatching delivery");

        let handle = tokio::spawn(async move { sink.output(records).await });

        DeliveryHandle { sink_name, handle }
    }
}
