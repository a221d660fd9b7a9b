//! Layered error definitions
//!
//! Categorized by source: config / source / buffer / processor / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Source startup error
    #[error("source '{source_name}' failed to start: {message}")]
    SourceStart {
        source_name: String,
        message: String,
    },

    // ===== Buffer Errors =====
    /// Buffer write error
    #[error("buffer write error: {message}")]
    BufferWrite { message: String },

    // ===== Processor Errors =====
    /// Processor execution error
    #[error("processor '{processor_name}' failed: {message}")]
    ProcessorFailure {
        processor_name: String,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== Event Errors =====
    /// Event payload error
    #[error("invalid event payload: {message}")]
    InvalidEvent { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create source startup error
    pub fn source_start(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceStart {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create buffer write error
    pub fn buffer_write(message: impl Into<String>) -> Self {
        Self::BufferWrite {
            message: message.into(),
        }
    }

    /// Create processor execution error
    pub fn processor_failure(
        processor_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProcessorFailure {
            processor_name: processor_name.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create event payload error
    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }
}
