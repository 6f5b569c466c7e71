//! LLM-synthesized report sections.
//!
//! The introduction, discussion, and conclusion are each generated from the
//! aggregated demand corpus by one completion call. A failed call degrades to
//! a bracketed placeholder so the report always assembles.

use tracing::warn;

use crate::llm::{CompletionClient, CompletionRequest};
use crate::prompts::{truncate_chars, SYNTHESIS_SYSTEM_PROMPT};

/// The three synthesized sections of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Introduction,
    Discussion,
    Conclusion,
}

impl SectionKind {
    /// Lowercase name used in prompts and placeholders.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Introduction => "introduction",
            Self::Discussion => "discussion",
            Self::Conclusion => "conclusion",
        }
    }

    /// Heading rendered in the report.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Introduction => "Introduction",
            Self::Discussion => "Discussion",
            Self::Conclusion => "Conclusion",
        }
    }

    /// Section-specific writing instruction.
    fn instruction(&self) -> &'static str {
        match self {
            Self::Introduction => {
                "Write a 5-paragraph introduction that sets the context, outlines the \
                 importance of pricing models, and previews the content of the report."
            }
            Self::Discussion => {
                "Write a discussion section that compares and contrasts the different \
                 models, highlights common themes, methodological differences, and \
                 implications. Identify any controversies or gaps."
            }
            Self::Conclusion => {
                "Write a 3-paragraph conclusion that summarizes the main insights, \
                 suggests future research directions, and reflects on the evolution of \
                 pricing models over the two decades."
            }
        }
    }

    /// Placeholder body used when the completion call fails.
    pub fn placeholder(&self) -> String {
        format!("[{} could not be generated due to API error.]", self.name())
    }
}

/// Build the synthesis prompt for one section.
///
/// The corpus is truncated to `char_budget` characters to respect upstream
/// token limits.
pub fn section_prompt(
    kind: SectionKind,
    corpus: &str,
    paper_count: usize,
    char_budget: usize,
) -> String {
    format!(
        "You are an expert researcher synthesizing findings from multiple scientific \
         papers about internet and bandwidth pricing models (1990-2010).\n\n\
         Below is the combined analysis of {} papers, each containing 8 detailed demands \
         (model explanation, formulas, algorithms, code, AI suggestions, datasets, and \
         key findings).\n\n\
         Please write a {} for a comprehensive report. {}\n\n\
         Here is the aggregated content from all papers:\n\n{}",
        paper_count,
        kind.name(),
        kind.instruction(),
        truncate_chars(corpus, char_budget)
    )
}

/// Generate one report section, degrading to a placeholder on failure.
pub async fn generate_section(
    client: &dyn CompletionClient,
    kind: SectionKind,
    corpus: &str,
    paper_count: usize,
    char_budget: usize,
    temperature: f64,
    max_tokens: u32,
) -> String {
    let prompt = section_prompt(kind, corpus, paper_count, char_budget);
    let request = CompletionRequest::new(SYNTHESIS_SYSTEM_PROMPT, prompt)
        .with_temperature(temperature)
        .with_max_tokens(max_tokens);

    match client.complete(request).await {
        Ok(text) => text,
        Err(e) => {
            warn!(section = kind.name(), error = %e, "Section synthesis failed");
            kind.placeholder()
        }
    }
}
