//! Pipeline orchestration.
//!
//! The orchestrator discovers papers from the configured source, fans them
//! out to a bounded pool of per-paper workers, and aggregates outcomes into a
//! run summary. One paper failing never aborts the run.

use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::extract::{PdfExtractor, TextExtractor};
use crate::llm::CompletionClient;
use crate::pipeline::config::{ConfigError, PipelineConfig, SourceKind};
use crate::pipeline::limiter::RateLimiter;
use crate::pipeline::worker::{PaperOutcome, PaperWorker};
use crate::prompts::PromptCatalog;
use crate::source::{discover_pdfs, LibraryClient, Paper};
use crate::store::ResultStore;

/// Errors that can occur during pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Paper discovery failed.
    #[error("Discovery error: {0}")]
    Source(#[from] SourceError),

    /// A library source was requested without a library client.
    #[error("Library source requires an access token")]
    MissingLibraryClient,

    /// Discovery found no papers at all.
    #[error("No papers found in source '{0}'")]
    EmptySource(String),
}

/// Aggregated outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Papers discovered.
    pub total: usize,
    /// Papers fully processed.
    pub completed: usize,
    /// Papers skipped because no text was available.
    pub skipped: usize,
    /// Papers whose results could not be persisted.
    pub failed: usize,
    /// `(title, reason)` for every skipped or failed paper.
    pub notes: Vec<(String, String)>,
}

impl RunSummary {
    fn record_completed(&mut self) {
        self.completed += 1;
    }

    fn record_skipped(&mut self, title: &str, reason: String) {
        self.skipped += 1;
        self.notes.push((title.to_string(), reason));
    }

    fn record_failed(&mut self, title: &str, error: String) {
        self.failed += 1;
        self.notes.push((title.to_string(), error));
    }

    /// True when every discovered paper completed.
    pub fn is_clean(&self) -> bool {
        self.completed == self.total
    }
}

/// Coordinates discovery and bounded-concurrency paper processing.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    worker: Arc<PaperWorker>,
    library: Option<LibraryClient>,
    /// Bounds papers in flight; completion calls are bounded separately by
    /// the worker's rate limiter.
    pool: Arc<Semaphore>,
}

impl PipelineOrchestrator {
    /// Create an orchestrator from a validated configuration.
    ///
    /// `library` is required only for [`SourceKind::Library`] sources.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(
        config: PipelineConfig,
        client: Arc<dyn CompletionClient>,
        library: Option<LibraryClient>,
    ) -> Result<Self, PipelineError> {
        Self::with_extractor(config, client, library, Arc::new(PdfExtractor::new()))
    }

    /// Create an orchestrator with a custom text extractor (for tests).
    pub fn with_extractor(
        config: PipelineConfig,
        client: Arc<dyn CompletionClient>,
        library: Option<LibraryClient>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        let worker = Arc::new(PaperWorker::new(
            extractor,
            client,
            ResultStore::new(&config.output_dir),
            RateLimiter::new(config.max_concurrent_requests, config.inter_call_delay),
            Arc::new(PromptCatalog::standard()),
            Client::new(),
            config.demand_char_budget,
            config.temperature,
            config.max_tokens,
        ));

        let pool = Arc::new(Semaphore::new(config.max_concurrent_papers));

        Ok(Self {
            config,
            worker,
            library,
            pool,
        })
    }

    /// Discover papers from the configured source.
    pub async fn discover(&self) -> Result<Vec<Paper>, PipelineError> {
        match self.config.source_kind {
            SourceKind::Folder => {
                let papers = discover_pdfs(&self.config.source_path)?;
                info!(
                    folder = %self.config.source_path.display(),
                    count = papers.len(),
                    "Discovered papers from folder"
                );
                Ok(papers)
            }
            SourceKind::Library => {
                let library = self
                    .library
                    .as_ref()
                    .ok_or(PipelineError::MissingLibraryClient)?;

                let collection_id = match &self.config.collection {
                    Some(name) => Some(library.resolve_collection(name).await?),
                    None => None,
                };

                let papers = library.list_papers(collection_id.as_deref()).await?;
                info!(count = papers.len(), "Discovered papers from library");
                Ok(papers)
            }
        }
    }

    /// Process the given papers under the worker pool bound.
    pub async fn run(&self, papers: Vec<Paper>) -> RunSummary {
        let mut summary = RunSummary {
            total: papers.len(),
            ..Default::default()
        };

        if papers.is_empty() {
            warn!("No papers to process");
            return summary;
        }

        info!(
            papers = papers.len(),
            pool = self.config.max_concurrent_papers,
            "Starting pipeline run"
        );

        let mut handles = Vec::with_capacity(papers.len());
        for paper in papers {
            let worker = Arc::clone(&self.worker);
            let pool = Arc::clone(&self.pool);
            handles.push(tokio::spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .expect("worker pool semaphore closed");
                let outcome = worker.process(&paper).await;
                (paper.title, outcome)
            }));
        }

        for handle in handles {
            match handle.await {
                Ok((title, outcome)) => match outcome {
                    PaperOutcome::Completed => summary.record_completed(),
                    PaperOutcome::Skipped { reason } => summary.record_skipped(&title, reason),
                    PaperOutcome::Failed { error } => summary.record_failed(&title, error),
                },
                Err(e) => {
                    summary.record_failed("<unknown>", format!("worker task failed: {}", e));
                }
            }
        }

        info!(
            total = summary.total,
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Pipeline run finished"
        );
        summary
    }

    /// Discover papers and process them in one call.
    ///
    /// An empty source is a configuration problem, not a clean run: it aborts
    /// before any work begins.
    pub async fn execute(&self) -> Result<RunSummary, PipelineError> {
        let papers = self.discover().await?;
        if papers.is_empty() {
            return Err(PipelineError::EmptySource(match self.config.source_kind {
                SourceKind::Folder => self.config.source_path.display().to_string(),
                SourceKind::Library => self
                    .config
                    .collection
                    .clone()
                    .unwrap_or_else(|| "library".to_string()),
            }));
        }
        Ok(self.run(papers).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::CompletionRequest;
    use async_trait::async_trait;

    struct NoopClient;

    #[async_trait]
    impl CompletionClient for NoopClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
            Ok("ok".to_string())
        }
    }

    fn folder_config(path: &std::path::Path, output: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            source_kind: SourceKind::Folder,
            source_path: path.to_path_buf(),
            output_dir: output.to_path_buf(),
            inter_call_delay: std::time::Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            max_concurrent_papers: 0,
            ..Default::default()
        };
        let result = PipelineOrchestrator::new(config, Arc::new(NoopClient), None);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[tokio::test]
    async fn test_library_source_without_client_fails_discovery() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig {
            source_kind: SourceKind::Library,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let orchestrator =
            PipelineOrchestrator::new(config, Arc::new(NoopClient), None).expect("orchestrator");

        let result = orchestrator.discover().await;
        assert!(matches!(result, Err(PipelineError::MissingLibraryClient)));
    }

    #[tokio::test]
    async fn test_empty_source_aborts_before_work() {
        let source = tempfile::tempdir().expect("tempdir");
        let output = tempfile::tempdir().expect("tempdir");
        let config = folder_config(source.path(), output.path());
        let orchestrator =
            PipelineOrchestrator::new(config, Arc::new(NoopClient), None).expect("orchestrator");

        let result = orchestrator.execute().await;
        assert!(matches!(result, Err(PipelineError::EmptySource(_))));
        assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_directory_is_fatal() {
        let output = tempfile::tempdir().expect("tempdir");
        let config = folder_config(std::path::Path::new("/nonexistent/papers"), output.path());
        let orchestrator =
            PipelineOrchestrator::new(config, Arc::new(NoopClient), None).expect("orchestrator");

        let result = orchestrator.execute().await;
        assert!(matches!(
            result,
            Err(PipelineError::Source(SourceError::DirectoryNotFound(_)))
        ));
    }

    #[test]
    fn test_summary_counters() {
        let mut summary = RunSummary {
            total: 3,
            ..Default::default()
        };
        summary.record_completed();
        summary.record_skipped("a", "no text".to_string());
        summary.record_failed("b", "disk full".to_string());

        assert_eq!(summary.completed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.notes.len(), 2);
        assert!(!summary.is_clean());
    }
}
