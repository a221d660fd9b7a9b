//! GeneratorSource - periodic synthetic events
//!
//! Emits numbered events at a fixed interval, optionally bounded by a count.
//! Useful for demos and tests that need a pipeline without external input.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use contracts::{Buffer, Event, EventMetadata, PipelineError, Record, Source};

use crate::config;

/// Generator configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Emission interval in milliseconds
    pub interval_ms: u64,

    /// Number of events to emit (None = unbounded)
    pub count: Option<u64>,

    /// Static fields copied into every event
    pub fields: Map<String, Value>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            count: None,
            fields: Map::new(),
        }
    }
}

/// Source emitting synthetic events on an interval
pub struct GeneratorSource {
    config: GeneratorConfig,
    running: Arc<AtomicBool>,
}

impl GeneratorSource {
    /// Create a generator with the given configuration
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a generator from an opaque plugin config value
    ///
    /// # Errors
    /// Returns a config parse error for a malformed value.
    pub fn from_config(value: &Value) -> Result<Self, PipelineError> {
        Ok(Self::new(config::bind("generator", value)?))
    }
}

#[async_trait::async_trait]
impl Source for GeneratorSource {
    fn name(&self) -> &str {
        "generator"
    }

    async fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), PipelineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let running = Arc::clone(&self.running);
        let interval = Duration::from_millis(self.config.interval_ms);
        let count = self.config.count;
        let fields = self.config.fields.clone();

        tokio::spawn(async move {
            let mut sequence: u64 = 0;
            while running.load(Ordering::Relaxed) {
                if count.is_some_and(|limit| sequence >= limit) {
                    break;
                }

                let mut event = Event::new();
                *event.metadata_mut() = EventMetadata::with_event_type("generated");
                for (key, value) in &fields {
                    event.put(key, value.clone());
                }
                event.put("sequence", sequence as i64);

                if buffer.write(Record::new(event)).await.is_err() {
                    break;
                }
                sequence += 1;
                tokio::time::sleep(interval).await;
            }
            debug!(emitted = sequence, "generator source finished");
        });

        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
