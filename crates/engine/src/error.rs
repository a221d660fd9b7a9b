//! Engine error types

use thiserror::Error;

use contracts::PipelineError;

use crate::pipeline::PipelineState;

/// Engine-specific errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source failed during pipeline startup
    #[error("pipeline '{pipeline}' source failed to start: {source}")]
    SourceStart {
        pipeline: String,
        #[source]
        source: PipelineError,
    },

    /// Operation attempted from the wrong lifecycle state
    #[error("pipeline '{pipeline}' cannot execute from state {state:?}")]
    InvalidState {
        pipeline: String,
        state: PipelineState,
    },

    /// Pipeline construction error
    #[error("pipeline configuration error: {message}")]
    Config { message: String },
}

impl EngineError {
    /// Create a pipeline construction error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
