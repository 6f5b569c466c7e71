//! Per-paper worker.
//!
//! A worker owns the full lifecycle of one paper: obtain the bytes, extract
//! text, then run every demand in catalog order and persist each response.
//! Failures are contained per paper and per demand: a paper that yields no
//! text is skipped without touching the output directory, and a failed
//! completion call loses that one demand while the rest proceed.

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::ExtractError;
use crate::extract::TextExtractor;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::pipeline::limiter::RateLimiter;
use crate::prompts::{demand_prompt, PromptCatalog, ANALYST_SYSTEM_PROMPT};
use crate::source::{Paper, PaperSource};
use crate::store::ResultStore;

/// Terminal state of one paper after a worker finishes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperOutcome {
    /// All demands ran; responses that arrived were persisted.
    Completed,
    /// No text could be obtained; nothing was written for this paper.
    Skipped { reason: String },
    /// Results could not be persisted.
    Failed { error: String },
}

/// Processes one paper end to end.
pub struct PaperWorker {
    extractor: Arc<dyn TextExtractor>,
    client: Arc<dyn CompletionClient>,
    store: ResultStore,
    limiter: RateLimiter,
    catalog: Arc<PromptCatalog>,
    /// Plain HTTP client for downloading remote papers.
    http: Client,
    demand_char_budget: usize,
    temperature: f64,
    max_tokens: u32,
}

impl PaperWorker {
    /// Create a worker sharing the run-wide client, store, and limiter.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        client: Arc<dyn CompletionClient>,
        store: ResultStore,
        limiter: RateLimiter,
        catalog: Arc<PromptCatalog>,
        http: Client,
        demand_char_budget: usize,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            extractor,
            client,
            store,
            limiter,
            catalog,
            http,
            demand_char_budget,
            temperature,
            max_tokens,
        }
    }

    /// Run every demand against one paper and persist the responses.
    pub async fn process(&self, paper: &Paper) -> PaperOutcome {
        info!(paper = %paper.title, "Processing paper");

        let text = match self.load_text(paper).await {
            Ok(text) => text,
            Err(e) => {
                warn!(paper = %paper.title, error = %e, "Skipping paper, no text available");
                return PaperOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        if text.trim().is_empty() {
            warn!(paper = %paper.title, "Skipping paper, extracted text is empty");
            return PaperOutcome::Skipped {
                reason: "extracted text is empty".to_string(),
            };
        }

        let mut failed_demands = 0usize;
        for demand in self.catalog.demands() {
            let prompt = demand_prompt(demand, &paper.title, &text, self.demand_char_budget);
            let request = CompletionRequest::new(ANALYST_SYSTEM_PROMPT, prompt)
                .with_temperature(self.temperature)
                .with_max_tokens(self.max_tokens);

            let response = {
                let _permit = self.limiter.acquire().await;
                self.client.complete(request).await
            };

            match response {
                Ok(response) => {
                    if let Err(e) = self.store.write_demand(&paper.title, demand, &response).await
                    {
                        return PaperOutcome::Failed {
                            error: e.to_string(),
                        };
                    }
                    debug!(paper = %paper.title, demand = demand.index, "Demand persisted");
                }
                Err(e) => {
                    warn!(
                        paper = %paper.title,
                        demand = demand.index,
                        error = %e,
                        "Demand failed, continuing with remaining demands"
                    );
                    failed_demands += 1;
                }
            }
        }

        info!(
            paper = %paper.title,
            demands = self.catalog.len(),
            failed = failed_demands,
            "Paper processed"
        );
        PaperOutcome::Completed
    }

    /// Obtain the paper's text: read or download the bytes, then extract.
    async fn load_text(&self, paper: &Paper) -> Result<String, ExtractError> {
        let bytes = match &paper.source {
            PaperSource::LocalFile(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| ExtractError::ReadFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?
            }
            PaperSource::Remote(url) => self.download(url).await?,
        };

        // PDF parsing is CPU-bound, keep it off the async runtime.
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|e| ExtractError::Extraction(format!("extraction task failed: {}", e)))?
    }

    /// Download a remote paper's bytes.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ExtractError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ExtractError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let bytes = response.bytes().await.map_err(|e| ExtractError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use std::time::Duration;

    struct FakeExtractor {
        text: String,
    }

    impl TextExtractor for FakeExtractor {
        fn extract(&self, _data: &[u8]) -> Result<String, ExtractError> {
            Ok(self.text.clone())
        }
    }

    struct FailingExtractor;

    impl TextExtractor for FailingExtractor {
        fn extract(&self, _data: &[u8]) -> Result<String, ExtractError> {
            Err(ExtractError::Extraction("corrupt document".to_string()))
        }
    }

    struct FakeClient {
        fail_on_demand: Option<usize>,
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            if let Some(n) = self.fail_on_demand {
                if request.user.contains(&format!("Demand {}:", n)) {
                    return Err(LlmError::Unavailable {
                        attempts: 3,
                        last_error: "simulated".to_string(),
                    });
                }
            }
            Ok("analysis result".to_string())
        }
    }

    fn worker_with(
        extractor: Arc<dyn TextExtractor>,
        client: Arc<dyn CompletionClient>,
        root: &std::path::Path,
    ) -> PaperWorker {
        PaperWorker::new(
            extractor,
            client,
            ResultStore::new(root),
            RateLimiter::new(4, Duration::ZERO),
            Arc::new(PromptCatalog::standard()),
            Client::new(),
            15_000,
            0.3,
            4000,
        )
    }

    #[tokio::test]
    async fn test_completed_paper_writes_all_demand_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = worker_with(
            Arc::new(FakeExtractor {
                text: "pricing model text".to_string(),
            }),
            Arc::new(FakeClient {
                fail_on_demand: None,
            }),
            dir.path(),
        );

        std::fs::write(dir.path().join("p.pdf"), b"%PDF").unwrap();
        let paper = Paper::local("My Paper.pdf", dir.path().join("p.pdf"));

        let outcome = worker.process(&paper).await;
        assert_eq!(outcome, PaperOutcome::Completed);

        let paper_dir = dir.path().join("My Paper.pdf");
        for i in 1..=8 {
            assert!(paper_dir.join(format!("demand_{:02}.txt", i)).exists());
        }
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("p.pdf"), b"%PDF").unwrap();
        let worker = worker_with(
            Arc::new(FailingExtractor),
            Arc::new(FakeClient {
                fail_on_demand: None,
            }),
            dir.path(),
        );

        let paper = Paper::local("Broken.pdf", dir.path().join("p.pdf"));
        let outcome = worker.process(&paper).await;
        assert!(matches!(outcome, PaperOutcome::Skipped { .. }));
        assert!(!dir.path().join("Broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_empty_text_skips_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("p.pdf"), b"%PDF").unwrap();
        let worker = worker_with(
            Arc::new(FakeExtractor {
                text: "   \n  ".to_string(),
            }),
            Arc::new(FakeClient {
                fail_on_demand: None,
            }),
            dir.path(),
        );

        let paper = Paper::local("Empty.pdf", dir.path().join("p.pdf"));
        let outcome = worker.process(&paper).await;
        assert!(matches!(outcome, PaperOutcome::Skipped { .. }));
        assert!(!dir.path().join("Empty.pdf").exists());
    }

    #[tokio::test]
    async fn test_missing_local_file_skips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = worker_with(
            Arc::new(FakeExtractor {
                text: "text".to_string(),
            }),
            Arc::new(FakeClient {
                fail_on_demand: None,
            }),
            dir.path(),
        );

        let paper = Paper::local("Gone.pdf", dir.path().join("gone.pdf"));
        let outcome = worker.process(&paper).await;
        assert!(matches!(outcome, PaperOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_failed_demand_loses_only_that_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("p.pdf"), b"%PDF").unwrap();
        let worker = worker_with(
            Arc::new(FakeExtractor {
                text: "pricing model text".to_string(),
            }),
            Arc::new(FakeClient {
                fail_on_demand: Some(3),
            }),
            dir.path(),
        );

        let paper = Paper::local("Partial.pdf", dir.path().join("p.pdf"));
        let outcome = worker.process(&paper).await;
        assert_eq!(outcome, PaperOutcome::Completed);

        let paper_dir = dir.path().join("Partial.pdf");
        assert!(!paper_dir.join("demand_03.txt").exists());
        assert!(paper_dir.join("demand_01.txt").exists());
        assert!(paper_dir.join("demand_08.txt").exists());
    }
}
