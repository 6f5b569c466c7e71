//! Markdown report rendering.
//!
//! Pure string assembly: given the synthesized sections, per-paper demand
//! contents, and metadata, render the final report. Papers from a
//! category-structured output root are grouped under category headings; code
//! demands render as fenced blocks; every paper gets a numbered citation that
//! reappears in the bibliography.

use crate::prompts::Demand;
use crate::report::metadata::PaperMetadata;
use crate::report::synthesis::SectionKind;

/// One paper's contribution to the report body.
#[derive(Debug, Clone)]
pub struct ReportPaper {
    /// Paper title (output directory name).
    pub title: String,
    /// Display name of the category the paper sits under, if any.
    pub category: Option<String>,
    /// Bibliographic metadata, if a lookup matched.
    pub metadata: Option<PaperMetadata>,
    /// Demand contents in catalog order, placeholders included.
    pub demands: Vec<String>,
}

/// Format the citation line for one paper.
///
/// Falls back to the bare title when no metadata (or no authors) is known.
pub fn citation(title: &str, metadata: Option<&PaperMetadata>) -> String {
    match metadata {
        Some(meta) if !meta.authors.is_empty() => {
            format!(
                "{} ({}). {}. {}.",
                meta.authors.join(", "),
                meta.year,
                meta.title,
                meta.source
            )
        }
        _ => format!("{} (metadata not found).", title),
    }
}

/// Render the full report as Markdown.
///
/// `demand_set` supplies the subsection labels and code flags; each paper's
/// `demands` must align with it positionally. Papers carrying a category are
/// expected to arrive grouped; a category heading is emitted each time the
/// category changes.
pub fn build_report(
    introduction: &str,
    papers: &[ReportPaper],
    discussion: &str,
    conclusion: &str,
    demand_set: &[Demand],
) -> String {
    let mut report = String::new();
    let mut citations = Vec::with_capacity(papers.len());
    let mut current_category: Option<&str> = None;

    report.push_str(&format!("# {}\n\n", SectionKind::Introduction.heading()));
    report.push_str(introduction.trim_end());
    report.push_str("\n\n");

    for paper in papers {
        if let Some(category) = paper.category.as_deref() {
            if current_category != Some(category) {
                report.push_str(&format!("# {}\n\n", category));
                current_category = Some(category);
            }
        }

        citations.push(citation(&paper.title, paper.metadata.as_ref()));
        report.push_str(&format!("## {} [{}]\n\n", paper.title, citations.len()));

        for (demand, content) in demand_set.iter().zip(&paper.demands) {
            report.push_str(&format!("### {}\n\n", demand.label));
            if demand.code {
                report.push_str("```python\n");
                report.push_str(content.trim_end());
                report.push_str("\n```\n\n");
            } else {
                report.push_str(content.trim_end());
                report.push_str("\n\n");
            }
        }
    }

    report.push_str(&format!("# {}\n\n", SectionKind::Discussion.heading()));
    report.push_str(discussion.trim_end());
    report.push_str("\n\n");

    report.push_str(&format!("# {}\n\n", SectionKind::Conclusion.heading()));
    report.push_str(conclusion.trim_end());
    report.push_str("\n\n");

    report.push_str("# Bibliography\n\n");
    for (idx, cit) in citations.iter().enumerate() {
        report.push_str(&format!("[{}] {}\n", idx + 1, cit));
    }

    report
}
