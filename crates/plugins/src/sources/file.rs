//! FileSource - NDJSON file ingestion
//!
//! Reads a newline-delimited JSON file and writes one record per line into
//! the buffer. Opening the file happens during `start`, so a missing file is
//! a startup failure surfaced to the pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use contracts::{Buffer, Event, PipelineError, Record, Source};

use crate::config;

/// File source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FileSourceConfig {
    /// Path to the NDJSON file
    pub path: PathBuf,
}

/// Source reading NDJSON records from a file
pub struct FileSource {
    config: FileSourceConfig,
    running: Arc<AtomicBool>,
}

impl FileSource {
    /// Create a file source with the given configuration
    pub fn new(config: FileSourceConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a file source from an opaque plugin config value
    ///
    /// # Errors
    /// Returns a config parse error when `path` is missing or malformed.
    pub fn from_config(value: &Value) -> Result<Self, PipelineError> {
        Ok(Self::new(config::bind_required("file", value)?))
    }
}

#[async_trait::async_trait]
impl Source for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn start(&self, buffer: Arc<dyn Buffer>) -> Result<(), PipelineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let path = self.config.path.clone();
        let file = File::open(&path).await.map_err(|e| {
            self.running.store(false, Ordering::SeqCst);
            PipelineError::source_start("file", format!("cannot open {}: {e}", path.display()))
        })?;

        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            let mut lines = BufReader::new(file).lines();
            let mut ingested: u64 = 0;
            let mut skipped: u64 = 0;

            loop {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "read failed, stopping file source");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let event = serde_json::from_str::<Value>(&line)
                    .map_err(|e| PipelineError::invalid_event(e.to_string()))
                    .and_then(Event::from_json);
                match event {
                    Ok(event) => {
                        if buffer.write(Record::new(event)).await.is_err() {
                            break;
                        }
                        ingested += 1;
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(path = %path.display(), error = %e, "skipping malformed line");
                    }
                }
            }

            debug!(path = %path.display(), ingested, skipped, "file source finished");
        });

        Ok(())
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
