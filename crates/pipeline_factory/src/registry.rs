//! PluginRegistry - explicit name-to-factory mapping
//!
//! Each plugin kind maps a registered name to a factory function taking the
//! plugin's opaque configuration value. Built-in plugins are registered by
//! `with_defaults`; embedders add their own before building pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use contracts::{Buffer, BufferSettings, PipelineError, Processor, Sink, Source};
use plugins::{
    AddFieldsProcessor, BlockingBuffer, FileSink, FileSource, GeneratorSource, LogSink,
    RenameFieldsProcessor,
};

use crate::error::FactoryError;

/// Plugin kind, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Source,
    Processor,
    Sink,
    Buffer,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Source => "source",
            Self::Processor => "processor",
            Self::Sink => "sink",
            Self::Buffer => "buffer",
        };
        f.write_str(name)
    }
}

type SourceFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn Source>, PipelineError> + Send + Sync>;
type ProcessorFactory =
    Box<dyn Fn(&Value) -> Result<Box<dyn Processor>, PipelineError> + Send + Sync>;
type SinkFactory =
    Box<dyn Fn(&str, &Value) -> Result<Arc<dyn Sink>, PipelineError> + Send + Sync>;
type BufferFactory =
    Box<dyn Fn(&BufferSettings) -> Result<Arc<dyn Buffer>, PipelineError> + Send + Sync>;

/// Registry mapping plugin names to factory functions
#[derive(Default)]
pub struct PluginRegistry {
    sources: HashMap<String, SourceFactory>,
    processors: HashMap<String, ProcessorFactory>,
    sinks: HashMap<String, SinkFactory>,
    buffers: HashMap<String, BufferFactory>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in plugins registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_source("generator", |config| {
            Ok(Arc::new(GeneratorSource::from_config(config)?))
        });
        registry.register_source("file", |config| {
            Ok(Arc::new(FileSource::from_config(config)?))
        });

        registry.register_processor("rename_fields", |config| {
            Ok(Box::new(RenameFieldsProcessor::from_config(config)?))
        });
        registry.register_processor("add_fields", |config| {
            Ok(Box::new(AddFieldsProcessor::from_config(config)?))
        });

        registry.register_sink("log", |name, _config| Ok(Arc::new(LogSink::new(name))));
        registry.register_sink("file", |name, config| {
            Ok(Arc::new(FileSink::from_config(name, config)?))
        });

        registry.register_buffer("blocking", |settings| {
            Ok(Arc::new(BlockingBuffer::new(
                settings.capacity,
                settings.batch_size,
            )))
        });

        registry
    }

    /// Register a source factory under a name
    pub fn register_source<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn Source>, PipelineError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(plugin = %name, "registered source plugin");
        self.sources.insert(name, Box::new(factory));
    }

    /// Register a processor factory under a name
    ///
    /// The factory is invoked once per worker so every worker owns its own
    /// processor instances.
    pub fn register_processor<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Value) -> Result<Box<dyn Processor>, PipelineError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(plugin = %name, "registered processor plugin");
        self.processors.insert(name, Box::new(factory));
    }

    /// Register a sink factory under a name
    ///
    /// The factory receives the sink's instance name and its config value.
    pub fn register_sink<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &Value) -> Result<Arc<dyn Sink>, PipelineError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(plugin = %name, "registered sink plugin");
        self.sinks.insert(name, Box::new(factory));
    }

    /// Register a buffer factory under a name
    pub fn register_buffer<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BufferSettings) -> Result<Arc<dyn Buffer>, PipelineError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(plugin = %name, "registered buffer plugin");
        self.buffers.insert(name, Box::new(factory));
    }

    /// Instantiate a source plugin
    ///
    /// # Errors
    /// `UnknownPlugin` for an unregistered name; plugin construction errors
    /// pass through.
    pub fn create_source(
        &self,
        name: &str,
        config: &Value,
    ) -> Result<Arc<dyn Source>, FactoryError> {
        let factory = self.sources.get(name).ok_or_else(|| {
            FactoryError::UnknownPlugin {
                kind: PluginKind::Source,
                name: name.to_string(),
            }
        })?;
        Ok(factory(config)?)
    }

    /// Instantiate a processor plugin
    pub fn create_processor(
        &self,
        name: &str,
        config: &Value,
    ) -> Result<Box<dyn Processor>, FactoryError> {
        let factory = self.processors.get(name).ok_or_else(|| {
            FactoryError::UnknownPlugin {
                kind: PluginKind::Processor,
                name: name.to_string(),
            }
        })?;
        Ok(factory(config)?)
    }

    /// Instantiate a sink plugin
    pub fn create_sink(
        &self,
        name: &str,
        instance_name: &str,
        config: &Value,
    ) -> Result<Arc<dyn Sink>, FactoryError> {
        let factory = self.sinks.get(name).ok_or_else(|| {
            FactoryError::UnknownPlugin {
                kind: PluginKind::Sink,
                name: name.to_string(),
            }
        })?;
        Ok(factory(instance_name, config)?)
    }

    /// Instantiate a buffer plugin
    pub fn create_buffer(
        &self,
        settings: &BufferSettings,
    ) -> Result<Arc<dyn Buffer>, FactoryError> {
        let factory = self.buffers.get(&settings.plugin).ok_or_else(|| {
            FactoryError::UnknownPlugin {
                kind: PluginKind::Buffer,
                name: settings.plugin.clone(),
            }
        })?;
        Ok(factory(settings)?)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("processors", &self.processors.keys().collect::<Vec<_>>())
            .field("sinks", &self.sinks.keys().collect::<Vec<_>>())
            .field("buffers", &self.buffers.keys().collect::<Vec<_>>())
            .finish()
    }
}
