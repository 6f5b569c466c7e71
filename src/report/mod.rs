//! Report assembly.
//!
//! Reads the per-paper demand files a pipeline run produced, looks up
//! bibliographic metadata, synthesizes the introduction, discussion, and
//! conclusion from the aggregated corpus, and renders one Markdown report.
//!
//! Two output layouts are recognized: a flat root where every subdirectory is
//! a paper, and a categorized root where papers sit under one of the four
//! known study-category directories and render grouped under a category
//! heading.

pub mod builder;
pub mod metadata;
pub mod synthesis;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::llm::CompletionClient;
use crate::prompts::PromptCatalog;
use crate::store::{ResultStore, StoreError};

pub use builder::{build_report, citation, ReportPaper};
pub use metadata::{MendeleyClient, MetadataLookup, PaperMetadata};
pub use synthesis::SectionKind;

/// Known category directory names and their report display names.
const CATEGORY_DIRS: [(&str, &str); 4] = [
    (
        "internet_pricing_1990_2000",
        "internet pricing (from 1990 to 2000)",
    ),
    (
        "bandwidth_pricing_1990_2000",
        "bandwidth pricing (from 1990 to 2000)",
    ),
    (
        "internet_pricing_2000_2010",
        "internet pricing (from 2000 to 2010)",
    ),
    (
        "bandwidth_pricing_2000_2010",
        "bandwidth pricing (from 2000 to 2010)",
    ),
];

/// Errors that can occur during report assembly.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Reading stored demand results failed.
    #[error("Result store error: {0}")]
    Store(#[from] StoreError),

    /// The output root contains no paper directories.
    #[error("No paper result directories found under '{0}'")]
    NoPapers(String),

    /// Writing the report file failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Assembles the final report from stored demand results.
pub struct ReportAssembler {
    store: ResultStore,
    client: Arc<dyn CompletionClient>,
    lookup: Arc<dyn MetadataLookup>,
    catalog: Arc<PromptCatalog>,
    synthesis_char_budget: usize,
    temperature: f64,
    max_tokens: u32,
}

impl ReportAssembler {
    /// Create an assembler over one result store.
    pub fn new(
        store: ResultStore,
        client: Arc<dyn CompletionClient>,
        lookup: Arc<dyn MetadataLookup>,
        catalog: Arc<PromptCatalog>,
        synthesis_char_budget: usize,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            store,
            client,
            lookup,
            catalog,
            synthesis_char_budget,
            temperature,
            max_tokens,
        }
    }

    /// Assemble the report and return it as a Markdown string.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::NoPapers` when the output root holds no paper
    /// directories; metadata and synthesis failures degrade instead of
    /// erroring.
    pub async fn assemble(&self) -> Result<String, ReportError> {
        let dirs = self.discover_paper_dirs().await?;
        if dirs.is_empty() {
            return Err(ReportError::NoPapers(
                self.store.root().display().to_string(),
            ));
        }

        info!(papers = dirs.len(), "Assembling report");

        // Read every paper's demand files and build the synthesis corpus.
        let n = self.catalog.len();
        let mut papers = Vec::with_capacity(dirs.len());
        let mut corpus = String::new();
        for (category, title, path) in dirs {
            let demands = self.store.read_demands(&path, n).await?;

            corpus.push_str(&format!("\n\n--- PAPER: {} ---\n", title));
            for (i, content) in demands.iter().enumerate() {
                corpus.push_str(&format!("\nDemand {}:\n{}\n", i + 1, content));
            }

            papers.push(ReportPaper {
                title,
                category,
                metadata: None,
                demands,
            });
        }

        // Metadata lookups fan out; failures degrade to the title fallback.
        let titles: Vec<String> = papers.iter().map(|p| p.title.clone()).collect();
        let metadata = metadata::fetch_all(Arc::clone(&self.lookup), &titles).await;
        for (paper, meta) in papers.iter_mut().zip(metadata) {
            paper.metadata = meta;
        }

        let introduction = self.section(SectionKind::Introduction, &corpus, papers.len()).await;
        let discussion = self.section(SectionKind::Discussion, &corpus, papers.len()).await;
        let conclusion = self.section(SectionKind::Conclusion, &corpus, papers.len()).await;

        Ok(build_report(
            &introduction,
            &papers,
            &discussion,
            &conclusion,
            self.catalog.demands(),
        ))
    }

    /// Assemble the report and write it to `path`.
    pub async fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let report = self.assemble().await?;
        tokio::fs::write(path, report).await?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }

    /// Enumerate paper directories, detecting the output layout.
    ///
    /// When any known category directory exists at the root, papers are its
    /// subdirectories and carry the category display name; other root entries
    /// are ignored. Otherwise every root subdirectory is a flat paper.
    async fn discover_paper_dirs(
        &self,
    ) -> Result<Vec<(Option<String>, String, PathBuf)>, ReportError> {
        let top = self.store.list_paper_dirs().await?;

        let categories: Vec<(&str, &PathBuf)> = top
            .iter()
            .filter_map(|(name, path)| {
                CATEGORY_DIRS
                    .iter()
                    .find(|(dir, _)| dir == name)
                    .map(|(_, display)| (*display, path))
            })
            .collect();

        if categories.is_empty() {
            return Ok(top
                .into_iter()
                .map(|(title, path)| (None, title, path))
                .collect());
        }

        info!(categories = categories.len(), "Detected category directories");
        let mut papers = Vec::new();
        for (display, path) in categories {
            for (title, dir) in self.store.list_dirs_in(path).await? {
                papers.push((Some(display.to_string()), title, dir));
            }
        }
        Ok(papers)
    }

    async fn section(&self, kind: SectionKind, corpus: &str, paper_count: usize) -> String {
        info!(section = kind.name(), "Generating section");
        synthesis::generate_section(
            self.client.as_ref(),
            kind,
            corpus,
            paper_count,
            self.synthesis_char_budget,
            self.temperature,
            self.max_tokens,
        )
        .await
    }
}
