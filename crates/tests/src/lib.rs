//! # Integration Tests
//!
//! End-to-end tests over the real plugins.
//!
//! Covers:
//! - Full definition -> factory -> pipeline runs
//! - Conditional routing to multiple sinks
//! - Shutdown invariants

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use engine::Pipeline;
    use pipeline_factory::PluginRegistry;

    async fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..500 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn build(toml: &str) -> Pipeline {
        let definition = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        pipeline_factory::build_pipeline(&definition, &PluginRegistry::with_defaults()).unwrap()
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// End-to-end: generator -> blocking buffer -> rename stage -> file sink
    #[tokio::test]
    async fn test_e2e_generator_through_stage_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.ndjson");

        let toml = format!(
            r#"
name = "e2e"

[timeouts]
read_batch_ms = 20
processor_shutdown_ms = 1000
sink_shutdown_ms = 1000

[source]
plugin = "generator"
[source.config]
interval_ms = 1
count = 10
[source.config.fields]
msg = "hello"

[[stages]]
[[stages.processors]]
plugin = "rename_fields"
[stages.processors.config]
entries = [{{ from = "msg", to = "message" }}]

[[sinks]]
plugin = "file"
[sinks.config]
path = "{}"
"#,
            out.display()
        );

        let pipeline = build(&toml);
        pipeline.execute().await.unwrap();

        let delivered =
            wait_until(|| pipeline.metrics().snapshot().records_delivered >= 10).await;
        assert!(delivered, "expected 10 records delivered");

        pipeline.shutdown().await;
        assert!(pipeline.is_stop_requested());

        let lines = read_lines(&out);
        assert_eq!(lines.len(), 10);
        for line in &lines {
            assert_eq!(line["message"], "hello");
            assert!(line.get("msg").is_none(), "field should have been renamed");
            assert!(line.get("sequence").is_some());
        }
    }

    /// End-to-end: conditional routing delivers only matching records to a
    /// route-restricted sink while an unrestricted sink receives everything
    #[tokio::test]
    async fn test_e2e_conditional_routing() {
        let dir = tempfile::tempdir().unwrap();
        let all_out = dir.path().join("all.ndjson");
        let tail_out = dir.path().join("tail.ndjson");

        let toml = format!(
            r#"
name = "routing"

[timeouts]
read_batch_ms = 20
processor_shutdown_ms = 1000
sink_shutdown_ms = 1000

[source]
plugin = "generator"
[source.config]
interval_ms = 1
count = 6

[routes.not_first]
type = "not_equals"
path = "sequence"
value = 0

[[sinks]]
plugin = "file"
name = "all_records"
[sinks.config]
path = "{all}"

[[sinks]]
plugin = "file"
name = "tail_records"
routes = ["not_first"]
[sinks.config]
path = "{tail}"
"#,
            all = all_out.display(),
            tail = tail_out.display()
        );

        let pipeline = build(&toml);
        pipeline.execute().await.unwrap();

        let settled = wait_until(|| {
            let snapshot = pipeline.metrics().snapshot();
            snapshot.records_processed >= 6 && snapshot.records_delivered >= 11
        })
        .await;
        assert!(settled, "expected 6 records through, 11 delivered across sinks");

        pipeline.shutdown().await;

        let all_lines = read_lines(&all_out);
        let tail_lines = read_lines(&tail_out);
        assert_eq!(all_lines.len(), 6);
        assert_eq!(tail_lines.len(), 5);
        for line in &tail_lines {
            assert_ne!(line["sequence"], 0, "sequence 0 must not be routed here");
        }
    }

    /// End-to-end: file source feeds the pipeline, startup failure surfaces
    #[tokio::test]
    async fn test_e2e_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.ndjson");
        let out = dir.path().join("out.ndjson");
        std::fs::write(&input, "{\"k\":1}\n{\"k\":2}\n{\"k\":3}\n").unwrap();

        let toml = format!(
            r#"
name = "file-fed"

[timeouts]
read_batch_ms = 20

[source]
plugin = "file"
[source.config]
path = "{input}"

[[sinks]]
plugin = "file"
[sinks.config]
path = "{out}"
"#,
            input = input.display(),
            out = out.display()
        );

        let pipeline = build(&toml);
        pipeline.execute().await.unwrap();

        let delivered = wait_until(|| pipeline.metrics().snapshot().records_delivered >= 3).await;
        assert!(delivered);
        pipeline.shutdown().await;

        assert_eq!(read_lines(&out).len(), 3);
    }

    /// A missing input file is a startup failure: execute errors and the
    /// pipeline never becomes live
    #[tokio::test]
    async fn test_e2e_source_startup_failure() {
        let toml = r#"
name = "broken"

[source]
plugin = "file"
[source.config]
path = "/nonexistent/input.ndjson"

[[sinks]]
plugin = "log"
"#;

        let pipeline = build(toml);
        let error = pipeline.execute().await.unwrap_err();
        assert!(error.to_string().contains("failed to start"));
        assert!(!pipeline.is_stop_requested());
    }

    /// Shutdown is idempotent across the whole assembled pipeline
    #[tokio::test]
    async fn test_e2e_shutdown_idempotence() {
        let toml = r#"
name = "shutdown"

[timeouts]
read_batch_ms = 20

[source]
plugin = "generator"
[source.config]
interval_ms = 5

[[sinks]]
plugin = "log"
"#;

        let pipeline = build(toml);
        pipeline.execute().await.unwrap();
        pipeline.shutdown().await;
        assert!(pipeline.is_stop_requested());
        pipeline.shutdown().await;
        assert!(pipeline.is_stop_requested());
    }

    /// Multiple workers drain the same buffer without losing records
    #[tokio::test]
    async fn test_e2e_multi_worker() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.ndjson");

        let toml = format!(
            r#"
name = "multi"
workers = 3

[timeouts]
read_batch_ms = 20
processor_shutdown_ms = 1000

[buffer]
capacity = 32
batch_size = 4

[source]
plugin = "generator"
[source.config]
interval_ms = 1
count = 30

[[stages]]
[[stages.processors]]
plugin = "add_fields"
[stages.processors.config]
fields = {{ worker_pass = true }}

[[sinks]]
plugin = "file"
[sinks.config]
path = "{}"
"#,
            out.display()
        );

        let pipeline = build(&toml);
        assert_eq!(pipeline.worker_count(), 3);
        pipeline.execute().await.unwrap();

        let delivered =
            wait_until(|| pipeline.metrics().snapshot().records_delivered >= 30).await;
        assert!(delivered, "expected all 30 records delivered");
        pipeline.shutdown().await;

        let lines = read_lines(&out);
        assert_eq!(lines.len(), 30);
        let mut sequences: Vec<i64> =
            lines.iter().map(|l| l["sequence"].as_i64().unwrap()).collect();
        sequences.sort_unstable();
        let expected: Vec<i64> = (0..30).collect();
        assert_eq!(sequences, expected, "no record lost or duplicated");
        assert!(lines.iter().all(|l| l["worker_pass"] == true));
    }
}
