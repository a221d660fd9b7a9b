//! Pipeline - root orchestrator
//!
//! Owns the source, the buffer, the processor worker pool, the router, and
//! the destination list; drives the run/stop state machine and coordinates
//! shutdown across all of them.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use contracts::{
    Buffer, DataFlowComponent, EventRecord, RouteStrategy, Sink, Source, WorkerStageSequence,
};

use crate::error::EngineError;
use crate::metrics::PipelineMetrics;
use crate::router::{ConditionRouter, Router};
use crate::sink_publisher::{DeliveryHandle, SinkPublisher};
use crate::strategy::ConditionStrategy;
use crate::worker::ProcessWorker;

/// Pipeline lifecycle state
///
/// Transitions are monotonic: `Initialized -> Running -> StopRequested ->
/// Stopped`. A failed source start leaves the pipeline in `Initialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum PipelineState {
    Initialized = 0,
    Running = 1,
    StopRequested = 2,
    Stopped = 3,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Initialized,
            1 => Self::Running,
            2 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

/// Atomic lifecycle state cell
///
/// The only cross-thread mutable value besides the buffer; a stop requested
/// by one task is observed by every worker on its next iteration.
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(PipelineState::Initialized as u8))
    }

    fn load(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::SeqCst))
    }

    fn try_advance(&self, from: PipelineState, to: PipelineState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Advance to `StopRequested` from any earlier state.
    ///
    /// Returns true only for the call that made the transition, giving
    /// `shutdown` its idempotence.
    fn request_stop(&self) -> bool {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if current >= PipelineState::StopRequested as u8 {
                return false;
            }
            match self.0.compare_exchange(
                current,
                PipelineState::StopRequested as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    fn mark_stopped(&self) {
        self.0.store(PipelineState::Stopped as u8, Ordering::SeqCst);
    }
}

/// Bounded waits applied during batching and shutdown
#[derive(Debug, Clone, Copy)]
pub struct PipelineTimeouts {
    /// Bounded wait for one buffer read
    pub read_batch: Duration,
    /// Bounded wait for workers to exit (and for their ready polls)
    pub processor_shutdown: Duration,
    /// Bounded wait for destination sink shutdown
    pub sink_shutdown: Duration,
    /// Grace period for in-flight hand-off left behind by abandoned workers
    pub drain: Duration,
}

impl Default for PipelineTimeouts {
    fn default() -> Self {
        Self {
            read_batch: Duration::from_millis(500),
            processor_shutdown: Duration::from_secs(10),
            sink_shutdown: Duration::from_secs(10),
            drain: Duration::ZERO,
        }
    }
}

struct PipelineInner {
    name: String,
    source: Arc<dyn Source>,
    buffer: Arc<dyn Buffer>,
    destinations: Vec<DataFlowComponent>,
    router: Box<dyn Router>,
    strategy: Box<dyn RouteStrategy>,
    timeouts: PipelineTimeouts,
    worker_count: usize,
    /// Per-stage processor names of one worker assignment, captured at build
    topology: Vec<Vec<String>>,
    state: StateCell,
    /// Stage sequences handed to workers by `execute`
    worker_sets: Mutex<Vec<WorkerStageSequence>>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
    metrics: PipelineMetrics,
}

/// The pipeline orchestrator
///
/// Cheap to clone; clones share the same underlying pipeline instance.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Pipeline {
    /// Start building a pipeline with the given name
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    /// Pipeline name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The configured source
    pub fn source(&self) -> &Arc<dyn Source> {
        &self.inner.source
    }

    /// The configured buffer
    pub fn buffer(&self) -> &Arc<dyn Buffer> {
        &self.inner.buffer
    }

    /// The configured destination sinks
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.inner
            .destinations
            .iter()
            .map(|destination| Arc::clone(destination.component()))
            .collect()
    }

    /// The configured destination descriptors
    pub fn destinations(&self) -> &[DataFlowComponent] {
        &self.inner.destinations
    }

    /// The configured stage topology: per-stage processor names of one
    /// worker assignment (every worker runs an identical copy)
    pub fn processor_sets(&self) -> &[Vec<String>] {
        &self.inner.topology
    }

    /// Number of processor workers
    pub fn worker_count(&self) -> usize {
        self.inner.worker_count
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.inner.state.load()
    }

    /// Whether `shutdown` has been invoked, regardless of drain progress
    pub fn is_stop_requested(&self) -> bool {
        self.inner.state.load() >= PipelineState::StopRequested
    }

    /// Pipeline metrics
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.inner.metrics
    }

    /// Configured timeouts
    pub fn timeouts(&self) -> &PipelineTimeouts {
        &self.inner.timeouts
    }

    /// Start the source and the processor workers
    ///
    /// Only valid from `Initialized`. A source startup failure propagates to
    /// the caller and leaves the state unchanged; the pipeline is not live.
    ///
    /// # Errors
    /// `SourceStart` when the source fails to start, `InvalidState` when the
    /// pipeline already ran.
    pub async fn execute(&self) -> Result<(), EngineError> {
        let state = self.inner.state.load();
        if state != PipelineState::Initialized {
            return Err(EngineError::InvalidState {
                pipeline: self.inner.name.clone(),
                state,
            });
        }

        info!(pipeline = %self.inner.name, "starting pipeline");

        self.inner
            .source
            .start(Arc::clone(&self.inner.buffer))
            .await
            .map_err(|source| EngineError::SourceStart {
                pipeline: self.inner.name.clone(),
                source,
            })?;

        let worker_sets = std::mem::take(
            &mut *self
                .inner
                .worker_sets
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        let mut handles = Vec::with_capacity(worker_sets.len());
        for (worker_id, stages) in worker_sets.into_iter().enumerate() {
            let worker = ProcessWorker::new(worker_id, self.clone(), stages);
            handles.push(tokio::spawn(worker.run()));
        }
        *self
            .inner
            .worker_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = handles;

        // A concurrent shutdown may already have advanced past Running; the
        // freshly spawned workers will observe it and drain immediately.
        self.inner
            .state
            .try_advance(PipelineState::Initialized, PipelineState::Running);

        info!(
            pipeline = %self.inner.name,
            workers = self.inner.worker_count,
            sinks = self.inner.destinations.len(),
            "pipeline running"
        );
        Ok(())
    }

    /// Stop the pipeline and drain with best effort
    ///
    /// Idempotent: only the first call performs shutdown work. Blocks up to
    /// processor-shutdown + sink-shutdown + drain timeouts in the worst case.
    pub async fn shutdown(&self) {
        if !self.inner.state.request_stop() {
            debug!(pipeline = %self.inner.name, "shutdown already requested");
            return;
        }

        info!(pipeline = %self.inner.name, "shutting down pipeline");

        self.inner.source.stop().await;

        let handles = std::mem::take(
            &mut *self
                .inner
                .worker_handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );

        let deadline = Instant::now() + self.inner.timeouts.processor_shutdown;
        let mut abandoned = 0usize;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(pipeline = %self.inner.name, worker = worker_id, error = ?e, "worker task failed");
                }
                Err(_) => {
                    abandoned += 1;
                    warn!(
                        pipeline = %self.inner.name,
                        worker = worker_id,
                        "worker did not exit within shutdown timeout, abandoning"
                    );
                }
            }
        }

        let sink_deadline = Instant::now() + self.inner.timeouts.sink_shutdown;
        for destination in &self.inner.destinations {
            let sink = destination.component();
            let remaining = sink_deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, sink.shutdown()).await.is_err() {
                warn!(
                    pipeline = %self.inner.name,
                    sink = sink.name(),
                    "sink shutdown timed out"
                );
            }
        }

        if abandoned > 0 && !self.inner.timeouts.drain.is_zero() {
            info!(
                pipeline = %self.inner.name,
                abandoned,
                "waiting for in-flight hand-off to settle"
            );
            tokio::time::sleep(self.inner.timeouts.drain).await;
        }

        self.inner.state.mark_stopped();
        info!(pipeline = %self.inner.name, "pipeline shutdown complete");
    }

    /// Route a batch and dispatch it to every matched destination
    ///
    /// Returns one completion handle per destination that actually received
    /// records; destinations matched to zero records receive no call and
    /// contribute no handle.
    pub fn publish_to_sinks(&self, records: Vec<EventRecord>) -> Vec<DeliveryHandle> {
        let mut handles = Vec::new();
        self.inner.router.route(
            &records,
            &self.inner.destinations,
            self.inner.strategy.as_ref(),
            &mut |destination, matched| {
                self.inner
                    .metrics
                    .record_delivery(destination.component().name(), matched.len());
                handles.push(SinkPublisher::publish(destination, matched));
            },
        );
        handles
    }

    /// Trigger an asynchronous pipeline-wide shutdown (fatal-failure path)
    pub(crate) fn initiate_shutdown(&self) {
        let pipeline = self.clone();
        tokio::spawn(async move {
            pipeline.shutdown().await;
        });
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .field("workers", &self.inner.worker_count)
            .field("sinks", &self.inner.destinations.len())
            .finish()
    }
}

/// Builder for assembling a pipeline
pub struct PipelineBuilder {
    name: String,
    source: Option<Arc<dyn Source>>,
    buffer: Option<Arc<dyn Buffer>>,
    worker_count: usize,
    worker_sets: Vec<WorkerStageSequence>,
    destinations: Vec<DataFlowComponent>,
    router: Option<Box<dyn Router>>,
    strategy: Option<Box<dyn RouteStrategy>>,
    timeouts: PipelineTimeouts,
}

impl PipelineBuilder {
    /// Create a builder with defaults: one worker, condition router, empty
    /// route set, default timeouts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            buffer: None,
            worker_count: 1,
            worker_sets: Vec::new(),
            destinations: Vec::new(),
            router: None,
            strategy: None,
            timeouts: PipelineTimeouts::default(),
        }
    }

    /// Set the source
    pub fn source(mut self, source: Arc<dyn Source>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the buffer
    pub fn buffer(mut self, buffer: Arc<dyn Buffer>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    /// Set the processor worker count
    pub fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Provide the per-worker stage sequences (one per worker, or none for
    /// pass-through workers)
    pub fn worker_sets(mut self, worker_sets: Vec<WorkerStageSequence>) -> Self {
        self.worker_sets = worker_sets;
        self
    }

    /// Add a destination
    pub fn destination(mut self, destination: DataFlowComponent) -> Self {
        self.destinations.push(destination);
        self
    }

    /// Set all destinations at once
    pub fn destinations(mut self, destinations: Vec<DataFlowComponent>) -> Self {
        self.destinations = destinations;
        self
    }

    /// Inject a router (defaults to `ConditionRouter`)
    pub fn router(mut self, router: Box<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Inject a route strategy (defaults to an empty `ConditionStrategy`)
    pub fn route_strategy(mut self, strategy: Box<dyn RouteStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the read-batch timeout
    pub fn read_batch_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read_batch = timeout;
        self
    }

    /// Set the processor-shutdown timeout
    pub fn processor_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.processor_shutdown = timeout;
        self
    }

    /// Set the sink-shutdown timeout
    pub fn sink_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.sink_shutdown = timeout;
        self
    }

    /// Set the drain timeout
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.drain = timeout;
        self
    }

    /// Set all timeouts at once
    pub fn timeouts(mut self, timeouts: PipelineTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Assemble the pipeline
    ///
    /// # Errors
    /// `Config` when a required component is missing, the worker count is
    /// zero, or the stage sequences do not line up one-per-worker.
    pub fn build(self) -> Result<Pipeline, EngineError> {
        let source = self
            .source
            .ok_or_else(|| EngineError::config("a source is required"))?;
        let buffer = self
            .buffer
            .ok_or_else(|| EngineError::config("a buffer is required"))?;
        if self.worker_count == 0 {
            return Err(EngineError::config("worker count must be positive"));
        }

        let worker_sets = if self.worker_sets.is_empty() {
            (0..self.worker_count)
                .map(|_| WorkerStageSequence::empty())
                .collect()
        } else if self.worker_sets.len() == self.worker_count {
            self.worker_sets
        } else {
            return Err(EngineError::config(format!(
                "expected one stage sequence per worker ({} workers, {} sequences)",
                self.worker_count,
                self.worker_sets.len()
            )));
        };

        if self.destinations.is_empty() {
            warn!(pipeline = %self.name, "no destinations configured, processed records will be dropped");
        }

        let topology = worker_sets
            .first()
            .map(WorkerStageSequence::topology)
            .unwrap_or_default();

        let metrics = PipelineMetrics::new(self.name.clone());

        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                name: self.name,
                source,
                buffer,
                destinations: self.destinations,
                router: self
                    .router
                    .unwrap_or_else(|| Box::new(ConditionRouter::new())),
                strategy: self
                    .strategy
                    .unwrap_or_else(|| Box::new(ConditionStrategy::default())),
                timeouts: self.timeouts,
                worker_count: self.worker_count,
                topology,
                state: StateCell::new(),
                worker_sets: Mutex::new(worker_sets),
                worker_handles: Mutex::new(Vec::new()),
                metrics,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use contracts::{Batch, Event, PipelineError, Processor, Record, Stage};

    use super::*;

    const TEST_PIPELINE_NAME: &str = "test-pipeline";

    // ===== Test doubles =====

    struct TestBuffer {
        queue: Mutex<VecDeque<EventRecord>>,
        batch_size: usize,
    }

    impl TestBuffer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                queue: Mutex::new(VecDeque::new()),
                batch_size: 16,
            })
        }
    }

    #[async_trait::async_trait]
    impl Buffer for TestBuffer {
        async fn write(&self, record: EventRecord) -> Result<(), PipelineError> {
            self.queue.lock().unwrap().push_back(record);
            Ok(())
        }

        async fn read_batch(&self, timeout: Duration) -> Batch {
            let batch: Vec<EventRecord> = {
                let mut queue = self.queue.lock().unwrap();
                let take = queue.len().min(self.batch_size);
                queue.drain(..take).collect()
            };
            if batch.is_empty() {
                tokio::time::sleep(timeout.min(Duration::from_millis(10))).await;
            }
            batch
        }
    }

    struct TestSource {
        fail: bool,
        records: usize,
        stopped: Arc<AtomicBool>,
    }

    impl TestSource {
        fn new(records: usize) -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                records,
                stopped: Arc::new(AtomicBool::new(false)),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                records: 0,
                stopped: Arc::new(AtomicBool::new(false)),
            })
        }
    }

    #[async_trait::async_trait]
    impl Source for TestSource {
        fn name(&self) -> &str {
            "test-source"
        }

        async fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), PipelineError> {
            if self.fail {
                return Err(PipelineError::source_start(
                    "test-source",
                    "source is expected to fail",
                ));
            }
            for i in 0..self.records {
                let mut event = Event::new();
                event.put("seq", i as i64);
                buffer.write(Record::new(event)).await?;
            }
            Ok(())
        }

        async fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct SinkCounters {
        outputs: AtomicUsize,
        output_records: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    struct TestSink {
        name: String,
        fail: bool,
        counters: Arc<SinkCounters>,
    }

    impl TestSink {
        fn new(name: &str) -> (Arc<Self>, Arc<SinkCounters>) {
            let counters = Arc::new(SinkCounters::default());
            (
                Arc::new(Self {
                    name: name.to_string(),
                    fail: false,
                    counters: Arc::clone(&counters),
                }),
                counters,
            )
        }

        fn failing(name: &str) -> (Arc<Self>, Arc<SinkCounters>) {
            let counters = Arc::new(SinkCounters::default());
            (
                Arc::new(Self {
                    name: name.to_string(),
                    fail: true,
                    counters: Arc::clone(&counters),
                }),
                counters,
            )
        }
    }

    #[async_trait::async_trait]
    impl Sink for TestSink {
        fn name(&self) -> &str {
            &self.name
        }

        async fn output(&self, records: Batch) -> Result<(), PipelineError> {
            self.counters.outputs.fetch_add(1, Ordering::SeqCst);
            self.counters
                .output_records
                .fetch_add(records.len(), Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::sink_write(
                    &self.name,
                    "sink is expected to fail",
                ));
            }
            Ok(())
        }

        async fn shutdown(&self) {
            self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct ProcessorCounters {
        executes: AtomicUsize,
        prepared: AtomicBool,
        shutdowns: AtomicUsize,
    }

    struct TestProcessor {
        fail: bool,
        counters: Arc<ProcessorCounters>,
    }

    impl TestProcessor {
        fn new() -> (Box<Self>, Arc<ProcessorCounters>) {
            let counters = Arc::new(ProcessorCounters::default());
            (
                Box::new(Self {
                    fail: false,
                    counters: Arc::clone(&counters),
                }),
                counters,
            )
        }

        fn failing() -> (Box<Self>, Arc<ProcessorCounters>) {
            let counters = Arc::new(ProcessorCounters::default());
            (
                Box::new(Self {
                    fail: true,
                    counters: Arc::clone(&counters),
                }),
                counters,
            )
        }
    }

    impl Processor for TestProcessor {
        fn name(&self) -> &str {
            "test-processor"
        }

        fn execute(&mut self, records: Batch) -> Result<Batch, PipelineError> {
            self.counters.executes.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::processor_failure(
                    "test-processor",
                    "processor is expected to fail",
                ));
            }
            Ok(records)
        }

        fn prepare_for_shutdown(&mut self) {
            self.counters.prepared.store(true, Ordering::SeqCst);
        }

        fn shutdown(&mut self) {
            self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Router fake delivering every record to every destination
    struct RouteToAll;

    impl Router for RouteToAll {
        fn route(
            &self,
            records: &[EventRecord],
            destinations: &[DataFlowComponent],
            _strategy: &dyn RouteStrategy,
            deliver: &mut dyn FnMut(&DataFlowComponent, Vec<EventRecord>),
        ) {
            for destination in destinations {
                deliver(destination, records.to_vec());
            }
        }
    }

    /// Router fake delivering every record to a single destination
    struct RouteToIndex(usize);

    impl Router for RouteToIndex {
        fn route(
            &self,
            records: &[EventRecord],
            destinations: &[DataFlowComponent],
            _strategy: &dyn RouteStrategy,
            deliver: &mut dyn FnMut(&DataFlowComponent, Vec<EventRecord>),
        ) {
            deliver(&destinations[self.0], records.to_vec());
        }
    }

    fn test_timeouts() -> PipelineTimeouts {
        PipelineTimeouts {
            read_batch: Duration::from_millis(50),
            processor_shutdown: Duration::from_millis(500),
            sink_shutdown: Duration::from_millis(500),
            drain: Duration::ZERO,
        }
    }

    async fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..300 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    // ===== Lifecycle tests =====

    #[tokio::test]
    async fn test_pipeline_state() {
        let (sink, counters) = TestSink::new("sink");
        let source = TestSource::new(0);
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(source.clone())
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        assert!(!pipeline.is_stop_requested());
        assert_eq!(pipeline.state(), PipelineState::Initialized);
        assert!(pipeline.processor_sets().is_empty());
        assert_eq!(pipeline.sinks().len(), 1);
        assert_eq!(pipeline.name(), TEST_PIPELINE_NAME);

        pipeline.execute().await.unwrap();
        assert!(!pipeline.is_stop_requested());
        assert_eq!(pipeline.state(), PipelineState::Running);

        pipeline.shutdown().await;
        assert!(pipeline.is_stop_requested());
        assert_eq!(pipeline.state(), PipelineState::Stopped);
        assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
        assert!(source.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_pipeline_state_with_processor() {
        let (sink, sink_counters) = TestSink::new("sink");
        let (processor, processor_counters) = TestProcessor::new();
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .worker_sets(vec![WorkerStageSequence::new(vec![Stage::new(vec![
                processor,
            ])])])
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        assert_eq!(pipeline.processor_sets().len(), 1);
        assert_eq!(pipeline.processor_sets()[0], vec!["test-processor".to_string()]);

        pipeline.execute().await.unwrap();
        pipeline.shutdown().await;

        assert!(pipeline.is_stop_requested());
        assert_eq!(sink_counters.shutdowns.load(Ordering::SeqCst), 1);
        assert!(processor_counters.prepared.load(Ordering::SeqCst));
        assert_eq!(processor_counters.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (sink, counters) = TestSink::new("sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.execute().await.unwrap();
        pipeline.shutdown().await;
        pipeline.shutdown().await;

        assert!(pipeline.is_stop_requested());
        assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_execute() {
        let (sink, counters) = TestSink::new("sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.shutdown().await;
        assert!(pipeline.is_stop_requested());
        assert_eq!(counters.shutdowns.load(Ordering::SeqCst), 1);

        // the lifecycle is monotonic: execute after shutdown is rejected
        assert!(matches!(
            pipeline.execute().await,
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[tokio::test]
    async fn test_execute_twice_is_rejected() {
        let (sink, _) = TestSink::new("sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.execute().await.unwrap();
        assert!(matches!(
            pipeline.execute().await,
            Err(EngineError::InvalidState { .. })
        ));
        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_execute_failing_source() {
        let (sink, _) = TestSink::new("sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::failing())
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        let error = pipeline.execute().await.unwrap_err();
        assert!(error.to_string().contains("source is expected to fail"));
        assert!(!pipeline.is_stop_requested());
        assert_eq!(pipeline.state(), PipelineState::Initialized);
    }

    // ===== Failure propagation tests =====

    #[tokio::test]
    async fn test_failing_sink_triggers_shutdown() {
        let (sink, counters) = TestSink::failing("failing-sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(3))
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.execute().await.unwrap();

        let stopped = wait_until(|| pipeline.is_stop_requested()).await;
        assert!(stopped, "sink failure should trigger pipeline shutdown");
        assert!(counters.outputs.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failing_processor_triggers_shutdown() {
        let (sink, sink_counters) = TestSink::new("sink");
        let (processor, processor_counters) = TestProcessor::failing();
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(3))
            .buffer(TestBuffer::new())
            .worker_sets(vec![WorkerStageSequence::new(vec![Stage::new(vec![
                processor,
            ])])])
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.execute().await.unwrap();

        let stopped = wait_until(|| pipeline.is_stop_requested()).await;
        assert!(stopped, "processor failure should trigger pipeline shutdown");
        // the failing worker still drains its own stages exactly once
        let drained =
            wait_until(|| processor_counters.shutdowns.load(Ordering::SeqCst) == 1).await;
        assert!(drained);
        // no records were published on the failure path
        assert_eq!(sink_counters.outputs.load(Ordering::SeqCst), 0);
    }

    // ===== publish_to_sinks tests =====

    fn publish_fixture(router: Box<dyn Router>) -> (Pipeline, Vec<Arc<SinkCounters>>) {
        let mut destinations = Vec::new();
        let mut counters = Vec::new();
        for i in 0..3 {
            let (sink, sink_counters) = TestSink::new(&format!("sink-{i}"));
            destinations.push(DataFlowComponent::unrestricted(sink));
            counters.push(sink_counters);
        }
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .destinations(destinations)
            .router(router)
            .timeouts(test_timeouts())
            .build()
            .unwrap();
        (pipeline, counters)
    }

    fn hundred_records() -> Vec<EventRecord> {
        (0..100)
            .map(|i| {
                let mut event = Event::new();
                event.put("seq", i as i64);
                Record::new(event)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_publish_to_sinks_returns_a_handle_per_routed_sink() {
        let (pipeline, counters) = publish_fixture(Box::new(RouteToAll));

        let handles = pipeline.publish_to_sinks(hundred_records());
        assert_eq!(handles.len(), 3);

        crate::future_helper::await_all(handles).await.unwrap();
        for sink_counters in &counters {
            assert_eq!(sink_counters.outputs.load(Ordering::SeqCst), 1);
            assert_eq!(sink_counters.output_records.load(Ordering::SeqCst), 100);
        }
    }

    #[tokio::test]
    async fn test_publish_to_sinks_skips_unrouted_sinks() {
        let (pipeline, counters) = publish_fixture(Box::new(RouteToIndex(1)));

        let handles = pipeline.publish_to_sinks(hundred_records());
        assert_eq!(handles.len(), 1);

        crate::future_helper::await_all(handles).await.unwrap();
        assert_eq!(counters[0].outputs.load(Ordering::SeqCst), 0);
        assert_eq!(counters[1].outputs.load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].output_records.load(Ordering::SeqCst), 100);
        assert_eq!(counters[2].outputs.load(Ordering::SeqCst), 0);
    }

    // ===== Builder tests =====

    #[tokio::test]
    async fn test_builder_rejects_mismatched_worker_sets() {
        let (sink, _) = TestSink::new("sink");
        let (processor, _) = TestProcessor::new();
        let result = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .buffer(TestBuffer::new())
            .workers(2)
            .worker_sets(vec![WorkerStageSequence::new(vec![Stage::new(vec![
                processor,
            ])])])
            .destination(DataFlowComponent::unrestricted(sink))
            .build();

        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[tokio::test]
    async fn test_builder_requires_source_and_buffer() {
        assert!(Pipeline::builder(TEST_PIPELINE_NAME).build().is_err());
        assert!(Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(0))
            .build()
            .is_err());
    }

    #[tokio::test]
    async fn test_steady_state_delivery() {
        let (sink, counters) = TestSink::new("sink");
        let pipeline = Pipeline::builder(TEST_PIPELINE_NAME)
            .source(TestSource::new(5))
            .buffer(TestBuffer::new())
            .destination(DataFlowComponent::unrestricted(sink))
            .timeouts(test_timeouts())
            .build()
            .unwrap();

        pipeline.execute().await.unwrap();
        let delivered =
            wait_until(|| counters.output_records.load(Ordering::SeqCst) == 5).await;
        assert!(delivered, "all source records should reach the sink");

        pipeline.shutdown().await;
        assert_eq!(pipeline.metrics().snapshot().records_processed, 5);
    }
}
