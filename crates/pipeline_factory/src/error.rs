//! Factory error types

use thiserror::Error;

use crate::registry::PluginKind;

/// Pipeline assembly errors
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No factory registered under the requested name
    #[error("unknown {kind} plugin '{name}'")]
    UnknownPlugin { kind: PluginKind, name: String },

    /// A sink subscribes to a route the definition does not declare
    #[error("sink '{sink}' references undeclared route '{route}'")]
    UnknownRoute { sink: String, route: String },

    /// Plugin construction error
    #[error("plugin error: {0}")]
    Plugin(#[from] contracts::PipelineError),

    /// Pipeline construction error
    #[error("engine error: {0}")]
    Engine(#[from] engine::EngineError),
}
