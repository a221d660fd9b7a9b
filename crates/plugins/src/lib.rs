//! # Plugins
//!
//! Reference plugin implementations consumed through the contracts traits:
//! the default blocking buffer, generator/file sources, field-mutation
//! processors, and log/file sinks.
//!
//! The engine treats all of these as external collaborators; nothing here is
//! engine-specific.

pub mod buffer;
mod config;
pub mod processors;
pub mod sinks;
pub mod sources;

pub use buffer::BlockingBuffer;
pub use processors::{AddFieldsProcessor, RenameFieldsProcessor};
pub use sinks::{FileSink, LogSink};
pub use sources::{FileSource, GeneratorSource};
