//! Sink trait and destination descriptor
//!
//! Defines the abstract interface for output destinations and the
//! `DataFlowComponent` pairing a sink with its routing configuration.

use std::sync::Arc;

use crate::{Batch, PipelineError};

/// Data output trait
///
/// `output` may be invoked concurrently for successive batches;
/// implementations use interior mutability where they keep state.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver a batch of routed records
    ///
    /// # Errors
    /// A delivery error is fatal to the pipeline; retry, if desired, is the
    /// sink's own responsibility before it reports failure.
    async fn output(&self, records: Batch) -> Result<(), PipelineError>;

    /// Close the sink, flushing anything buffered
    async fn shutdown(&self);
}

/// A sink paired with the routes it subscribes to
///
/// Immutable after pipeline construction. An empty route set means the
/// destination is unrestricted and receives every record.
#[derive(Clone)]
pub struct DataFlowComponent {
    sink: Arc<dyn Sink>,
    routes: Vec<String>,
}

impl DataFlowComponent {
    /// Pair a sink with the routes it subscribes to
    pub fn new(sink: Arc<dyn Sink>, routes: Vec<String>) -> Self {
        Self { sink, routes }
    }

    /// Pair a sink with no route restriction
    pub fn unrestricted(sink: Arc<dyn Sink>) -> Self {
        Self::new(sink, Vec::new())
    }

    /// The wrapped sink
    pub fn component(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Subscribed route names
    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    /// Whether this destination matches every record
    pub fn is_unrestricted(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for DataFlowComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFlowComponent")
            .field("sink", &self.sink.name())
            .field("routes", &self.routes)
            .finish()
    }
}
