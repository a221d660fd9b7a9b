//! Source trait - record origination abstraction
//!
//! Defines a unified interface for components that originate records into a
//! pipeline, decoupling the engine from protocol-specific acquisition logic.

use std::sync::Arc;

use crate::{Buffer, PipelineError};

/// Record origination trait
///
/// A source acquires data from the outside world and writes records into the
/// buffer it is started against.
///
/// # Design Principles
///
/// 1. **Own your execution context**: `start` must spawn whatever background
///    work the source needs and return promptly; a blocking acquisition loop
///    must not run on the caller's task.
/// 2. **Fail loudly at startup**: an error establishing the source (opening a
///    file, binding a listener) is returned from `start`, never swallowed.
///    The pipeline treats it as fatal and does not begin running.
/// 3. **Advisory stop**: `stop` is idempotent and takes effect at the
///    source's next safe boundary.
#[async_trait::async_trait]
pub trait Source: Send + Sync {
    /// Source name (used for logging/diagnostics)
    fn name(&self) -> &str;

    /// Begin writing records into the given buffer
    ///
    /// # Errors
    /// Returns a startup failure; the source must not leave background work
    /// running when it errors.
    async fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), PipelineError>;

    /// Stop originating records
    async fn stop(&self);
}
