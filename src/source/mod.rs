//! Paper discovery.
//!
//! A run processes papers from exactly one source: a local folder of PDFs or
//! a remote library (optionally restricted to one named collection). Each
//! discovered [`Paper`] carries exactly one content source and is consumed by
//! exactly one worker.

pub mod folder;
pub mod library;

use std::path::PathBuf;

pub use folder::discover_pdfs;
pub use library::LibraryClient;

/// Where a paper's bytes come from. Exactly one variant per paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaperSource {
    /// A PDF on the local filesystem.
    LocalFile(PathBuf),
    /// A resolved download URL for a remote PDF.
    Remote(String),
}

/// One paper: identity plus its single content source.
#[derive(Debug, Clone)]
pub struct Paper {
    /// Paper identity; also keys the per-paper output directory.
    pub title: String,
    /// Content source, consumed once by the worker.
    pub source: PaperSource,
}

impl Paper {
    /// Create a paper backed by a local file.
    pub fn local(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            source: PaperSource::LocalFile(path.into()),
        }
    }

    /// Create a paper backed by a remote download URL.
    pub fn remote(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: PaperSource::Remote(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_constructors() {
        let local = Paper::local("A Paper", "/tmp/a.pdf");
        assert_eq!(local.title, "A Paper");
        assert_eq!(
            local.source,
            PaperSource::LocalFile(PathBuf::from("/tmp/a.pdf"))
        );

        let remote = Paper::remote("B Paper", "https://example.com/b.pdf");
        assert_eq!(
            remote.source,
            PaperSource::Remote("https://example.com/b.pdf".to_string())
        );
    }
}
