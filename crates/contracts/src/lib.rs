//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are
//! prohibited.
//!
//! ## Data Model
//! - `Record<T>` is the immutable envelope moved between stages
//! - `Event` is the canonical structured payload (ordered field map,
//!   addressed by `/`-separated paths)

mod buffer;
mod definition;
mod error;
mod event;
mod processor;
mod record;
mod route;
mod sink;
mod source;

pub use buffer::Buffer;
pub use definition::*;
pub use error::PipelineError;
pub use event::{Event, EventMetadata};
pub use processor::{Processor, Stage, WorkerStageSequence};
pub use record::{Batch, EventRecord, Record};
pub use route::{RouteCondition, RouteStrategy};
pub use sink::{DataFlowComponent, Sink};
pub use source::Source;
