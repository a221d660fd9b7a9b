//! # Pipeline Factory
//!
//! Plugin registration and pipeline assembly.
//!
//! Responsible for:
//! - The explicit plugin registry (name -> factory function)
//! - Building an `engine::Pipeline` from a `PipelineDefinition`
//!
//! Registration happens at process startup, outside the engine; the engine
//! never constructs plugins itself.

mod error;
mod factory;
mod registry;

pub use error::FactoryError;
pub use factory::build_pipeline;
pub use registry::{PluginKind, PluginRegistry};
