//! Processor trait and stage structure
//!
//! A processor transforms a batch of records. Stages group processors that
//! run in series as one logical transformation step; a worker's full chain is
//! a `WorkerStageSequence`.

use crate::{Batch, PipelineError};

/// Batch transformation trait
///
/// Each processor worker owns its own processor instances; `execute` takes
/// `&mut self` so stateful processors (e.g. aggregators) need no internal
/// locking.
pub trait Processor: Send {
    /// Processor name (used for logging/diagnostics)
    fn name(&self) -> &str;

    /// Transform a batch, producing the input of the next processor
    ///
    /// # Errors
    /// A failure here is fatal to the pipeline; it is never retried.
    fn execute(&mut self, records: Batch) -> Result<Batch, PipelineError>;

    /// Signal that shutdown is imminent, letting stateful processors begin
    /// flushing. Default: no-op.
    fn prepare_for_shutdown(&mut self) {}

    /// Whether the processor has finished flushing and may be shut down.
    /// Default: always ready.
    fn is_ready_for_shutdown(&self) -> bool {
        true
    }

    /// Release resources. Called exactly once, after the ready poll.
    /// Default: no-op.
    fn shutdown(&mut self) {}
}

/// One logical transformation step: processors executed in series
pub struct Stage {
    processors: Vec<Box<dyn Processor>>,
}

impl Stage {
    /// Create a stage from its ordered processors
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Ordered processors of this stage
    pub fn processors(&self) -> &[Box<dyn Processor>] {
        &self.processors
    }

    /// Mutable access for the owning worker
    pub fn processors_mut(&mut self) -> &mut [Box<dyn Processor>] {
        &mut self.processors
    }

    /// Number of processors in this stage
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the stage has no processors
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Names of the processors in order
    pub fn processor_names(&self) -> Vec<String> {
        self.processors.iter().map(|p| p.name().to_string()).collect()
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("processors", &self.processor_names())
            .finish()
    }
}

/// The full ordered stage chain run by one processor worker
///
/// Each worker receives its own instance; the engine never shares processor
/// state across workers.
#[derive(Debug, Default)]
pub struct WorkerStageSequence {
    stages: Vec<Stage>,
}

impl WorkerStageSequence {
    /// Create a sequence from its ordered stages
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// A sequence with no stages (records pass through untransformed)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ordered stages
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Mutable access for the owning worker
    pub fn stages_mut(&mut self) -> &mut [Stage] {
        &mut self.stages
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the sequence has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Per-stage processor names, for topology introspection
    pub fn topology(&self) -> Vec<Vec<String>> {
        self.stages.iter().map(Stage::processor_names).collect()
    }
}
