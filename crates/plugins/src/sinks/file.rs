//! FileSink - NDJSON append sink

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::Value;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tracing::{error, info};

use contracts::{Batch, PipelineError, Sink};

use crate::config;

/// File sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// Output path; the file is created or appended to
    pub path: PathBuf,
}

/// Sink appending one JSON line per record
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    written: AtomicU64,
}

impl FileSink {
    /// Create a file sink, opening (or creating) the output file
    ///
    /// # Errors
    /// Returns a sink error when the file cannot be opened.
    pub fn create(name: impl Into<String>, config: FileSinkConfig) -> Result<Self, PipelineError> {
        let name = name.into();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .map_err(|e| {
                PipelineError::sink_write(
                    &name,
                    format!("cannot open {}: {e}", config.path.display()),
                )
            })?;

        Ok(Self {
            name,
            path: config.path,
            writer: Mutex::new(BufWriter::new(File::from_std(file))),
            written: AtomicU64::new(0),
        })
    }

    /// Create a file sink from an opaque plugin config value
    ///
    /// # Errors
    /// Returns a config parse error when `path` is missing, or a sink error
    /// when the file cannot be opened.
    pub fn from_config(name: impl Into<String>, value: &Value) -> Result<Self, PipelineError> {
        let config: FileSinkConfig = config::bind_required("file", value)?;
        Self::create(name, config)
    }

    /// Records written so far
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn output(&self, records: Batch) -> Result<(), PipelineError> {
        let count = records.len();
        let mut writer = self.writer.lock().await;
        for record in &records {
            let line = record.data().to_json_bytes()?;
            writer
                .write_all(&line)
                .await
                .map_err(|e| PipelineError::sink_write(&self.name, e.to_string()))?;
            writer
                .write_all(b"\n")
                .await
                .map_err(|e| PipelineError::sink_write(&self.name, e.to_string()))?;
        }
        self.written.fetch_add(count as u64, Ordering::Relaxed);
        Ok(())
    }

    async fn shutdown(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.flush().await {
            error!(sink = %self.name, error = %e, "flush failed on shutdown");
        }
        info!(
            sink = %self.name,
            path = %self.path.display(),
            total = self.written(),
            "file sink closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use contracts::{Event, Record};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_writes_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ndjson");
        let sink = FileSink::from_config("file_out", &json!({ "path": path })).unwrap();

        let mut first = Event::new();
        first.put("seq", 1);
        let mut second = Event::new();
        second.put("seq", 2);
        sink.output(vec![Record::new(first), Record::new(second)])
            .await
            .unwrap();
        sink.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("out.ndjson")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"seq":1}"#);
        assert_eq!(lines[1], r#"{"seq":2}"#);
        assert_eq!(sink.written(), 2);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let result = FileSink::from_config(
            "file_out",
            &json!({ "path": "/nonexistent/dir/out.ndjson" }),
        );
        assert!(result.is_err());
    }
}
