//! # Engine
//!
//! Pipeline execution engine.
//!
//! Responsible for:
//! - The `Pipeline` orchestrator and its run/stop state machine
//! - The processor worker pool draining the buffer
//! - Conditional fan-out routing to destinations
//! - Asynchronous sink publishing with completion handles

pub mod error;
pub mod future_helper;
pub mod metrics;
pub mod pipeline;
pub mod router;
pub mod sink_publisher;
pub mod strategy;
mod worker;

pub use error::EngineError;
pub use future_helper::await_all;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineState, PipelineTimeouts};
pub use router::{ConditionRouter, Router};
pub use sink_publisher::{DeliveryHandle, SinkPublisher};
pub use strategy::ConditionStrategy;
