//! Result store: per-paper, per-demand output files.
//!
//! Layout under one output root:
//!
//! ```text
//! <root>/<sanitized paper title>/demand_01.txt
//! <root>/<sanitized paper title>/demand_02.txt
//! ...
//! ```
//!
//! Each file is a three-line header (paper title, demand label, separator)
//! followed by the raw response. Writes overwrite by name, so re-running a
//! pipeline repairs partial output instead of duplicating it. Directories are
//! created lazily: a skipped paper leaves no trace.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

use crate::prompts::Demand;

/// Separator line between the result header and the response body.
const HEADER_RULE_LEN: usize = 80;

/// Errors that can occur during result store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write to the filesystem.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The output directory could not be created.
    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Strip every character outside the safe set (alphanumeric, space, `.`,
/// `_`, `-`) and trim surrounding whitespace.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '.' | '_' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// File name for one demand result: zero-padded two-digit index.
pub fn demand_file_name(index: usize) -> String {
    format!("demand_{:02}.txt", index)
}

/// File-based store for per-paper demand results.
#[derive(Debug, Clone)]
pub struct ResultStore {
    /// Output root; one subdirectory per paper.
    root: PathBuf,
}

impl ResultStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one paper, derived from its sanitized title.
    pub fn paper_dir(&self, title: &str) -> PathBuf {
        self.root.join(sanitize_title(title))
    }

    /// Persist one demand result, overwriting any previous file.
    ///
    /// Returns the path written.
    pub async fn write_demand(
        &self,
        title: &str,
        demand: &Demand,
        response: &str,
    ) -> Result<PathBuf, StoreError> {
        let dir = self.paper_dir(title);
        fs::create_dir_all(&dir).await.map_err(|e| {
            StoreError::DirectoryCreationFailed(format!(
                "Failed to create directory {:?}: {}",
                dir, e
            ))
        })?;

        let path = dir.join(demand_file_name(demand.index));
        let contents = format!(
            "Paper: {}\nDemand {}: {}\n{}\n{}",
            title,
            demand.index,
            demand.text,
            "=".repeat(HEADER_RULE_LEN),
            response
        );
        fs::write(&path, contents).await?;

        Ok(path)
    }

    /// Read back the results for one paper directory.
    ///
    /// Returns exactly `n` entries in demand order; a missing file yields a
    /// `*Missing demand N*` placeholder so report assembly stays total.
    pub async fn read_demands(&self, paper_dir: &Path, n: usize) -> Result<Vec<String>, StoreError> {
        let mut results = Vec::with_capacity(n);
        for index in 1..=n {
            let path = paper_dir.join(demand_file_name(index));
            match fs::read_to_string(&path).await {
                Ok(contents) => results.push(contents),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    results.push(format!("*Missing demand {}*", index));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(results)
    }

    /// Enumerate paper result directories at the output root, sorted by name.
    ///
    /// Returns `(title, path)` pairs where the title is the directory name.
    pub async fn list_paper_dirs(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
        self.list_dirs_in(&self.root).await
    }

    /// Enumerate subdirectories of `parent`, sorted by name.
    pub async fn list_dirs_in(&self, parent: &Path) -> Result<Vec<(String, PathBuf)>, StoreError> {
        let mut dirs = Vec::new();
        let mut entries = fs::read_dir(parent).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                dirs.push((name.to_string(), path.clone()));
            }
        }

        dirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(dirs)
    }
}
