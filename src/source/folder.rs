//! Local folder discovery: scan one directory for PDF files.

use std::path::Path;

use crate::error::SourceError;
use crate::source::Paper;

/// Discover all PDFs directly inside `folder` (no recursion).
///
/// The paper title is the file name. Results are sorted by title so runs are
/// deterministic. An unreadable or missing directory is a fatal discovery
/// error.
pub fn discover_pdfs(folder: &Path) -> Result<Vec<Paper>, SourceError> {
    if !folder.is_dir() {
        return Err(SourceError::DirectoryNotFound(
            folder.display().to_string(),
        ));
    }

    let mut papers = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            papers.push(Paper::local(name, path.clone()));
        }
    }

    papers.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(papers)
}
