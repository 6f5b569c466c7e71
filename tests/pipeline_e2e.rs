//! End-to-end pipeline test.
//!
//! Drives the orchestrator over a folder of fixture "papers" with a fake
//! completion client and a byte-passthrough extractor: one paper yields no
//! text and is skipped, the others complete with one result file per demand.
//! Also checks the global rate limit and that a re-run is byte-identical.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use paperforge::error::{ExtractError, LlmError};
use paperforge::extract::TextExtractor;
use paperforge::llm::{CompletionClient, CompletionRequest};
use paperforge::pipeline::{PipelineConfig, PipelineOrchestrator, SourceKind};

/// Treats the file bytes as UTF-8 text, so fixtures are plain text files.
struct PassthroughExtractor;

impl TextExtractor for PassthroughExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::Extraction(e.to_string()))
    }
}

/// Deterministic fake client that tracks how many calls run concurrently.
struct CountingClient {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl CountingClient {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionClient for CountingClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Hold the slot long enough for overlap to be observable.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        // Deterministic response derived from the prompt, so re-runs produce
        // byte-identical output files.
        let demand_line = request
            .user
            .lines()
            .find(|l| l.starts_with("Demand "))
            .unwrap_or("Demand ?")
            .to_string();
        Ok(format!("Analysis for {}", demand_line))
    }
}

fn config_for(source: &std::path::Path, output: &std::path::Path) -> PipelineConfig {
    PipelineConfig {
        source_kind: SourceKind::Folder,
        source_path: source.to_path_buf(),
        output_dir: output.to_path_buf(),
        max_concurrent_papers: 3,
        max_concurrent_requests: 2,
        inter_call_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn write_fixtures(source: &std::path::Path) {
    std::fs::write(source.join("alpha.pdf"), "alpha pricing model text").unwrap();
    std::fs::write(source.join("beta.pdf"), "beta pricing model text").unwrap();
    // Empty file: extraction yields no text and the paper is skipped.
    std::fs::write(source.join("empty.pdf"), "").unwrap();
}

#[tokio::test]
async fn full_run_processes_folder_and_respects_rate_limit() {
    let source = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    write_fixtures(source.path());

    let client = Arc::new(CountingClient::new());
    let orchestrator = PipelineOrchestrator::with_extractor(
        config_for(source.path(), output.path()),
        client.clone(),
        None,
        Arc::new(PassthroughExtractor),
    )
    .expect("orchestrator");

    let summary = orchestrator.execute().await.expect("run");

    assert_eq!(summary.total, 3);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.notes.len(), 1);
    assert_eq!(summary.notes[0].0, "empty.pdf");

    // 2 completed papers x 8 demands.
    assert_eq!(client.calls.load(Ordering::SeqCst), 16);
    assert!(client.peak.load(Ordering::SeqCst) <= 2);

    // Each completed paper has exactly the eight demand files.
    for paper in ["alpha.pdf", "beta.pdf"] {
        let dir = output.path().join(paper);
        for i in 1..=8 {
            let path = dir.join(format!("demand_{:02}.txt", i));
            assert!(path.exists(), "missing {:?}", path);
            let contents = std::fs::read_to_string(&path).unwrap();
            assert!(contents.starts_with(&format!("Paper: {}", paper)));
            assert!(contents.contains(&format!("Analysis for Demand {}:", i)));
        }
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 8);
    }

    // The skipped paper left no directory behind.
    assert!(!output.path().join("empty.pdf").exists());
}

#[tokio::test]
async fn rerun_is_idempotent() {
    let source = tempfile::tempdir().expect("tempdir");
    let output = tempfile::tempdir().expect("tempdir");
    write_fixtures(source.path());

    let run = |_: ()| async {
        let orchestrator = PipelineOrchestrator::with_extractor(
            config_for(source.path(), output.path()),
            Arc::new(CountingClient::new()),
            None,
            Arc::new(PassthroughExtractor),
        )
        .expect("orchestrator");
        orchestrator.execute().await.expect("run")
    };

    run(()).await;
    let first: Vec<(String, Vec<u8>)> = collect_files(output.path());

    run(()).await;
    let second: Vec<(String, Vec<u8>)> = collect_files(output.path());

    assert_eq!(first, second);
}

fn collect_files(root: &std::path::Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(root).unwrap() {
        let dir = entry.unwrap().path();
        if !dir.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(&dir).unwrap() {
            let path = file.unwrap().path();
            let name = path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned();
            files.push((name, std::fs::read(&path).unwrap()));
        }
    }
    files.sort();
    files
}
