//! Demand catalog and prompt construction.
//!
//! A *demand* is one fixed analysis prompt applied identically to every
//! paper. The standard catalog carries the eight demands of the pricing-model
//! study together with the report subsection label each one renders under.

/// System prompt for per-demand analysis calls.
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a research assistant specializing in economic \
models and internet pricing. Provide detailed, accurate answers.";

/// System prompt for report synthesis calls (introduction, discussion, conclusion).
pub const SYNTHESIS_SYSTEM_PROMPT: &str =
    "You are a research assistant specializing in economic models of internet pricing.";

/// The standard demand texts, applied in order to every paper.
const STANDARD_DEMANDS: [(&str, &str, bool); 8] = [
    (
        "1. Explain the pricing model proposed in this paper in an understandable way. Include any key assumptions and economic principles.",
        "a) Explanation of the pricing model proposed in this paper",
        false,
    ),
    (
        "2. Write down all mathematical formulas used in the model, formatted so they can be copied as plain text (e.g., using LaTeX-like notation or plain text equations).",
        "b) Mathematical formulas",
        false,
    ),
    (
        "3. Provide a step-by-step algorithm to perform a Monte Carlo simulation of this model.",
        "c) Step-by-step algorithm to perform a Monte Carlo simulation",
        false,
    ),
    (
        "4. Write the Python code that implements the Monte Carlo simulation described in step 3.",
        "d) Python code that implements the Monte Carlo simulation",
        true,
    ),
    (
        "5. Suggest the best machine learning or AI algorithm to predict internet prices based on this model, and justify your choice.",
        "e) Best machine learning or AI algorithm to predict internet prices based on this model",
        false,
    ),
    (
        "6. Write the Python code for that AI algorithm, including necessary data preprocessing steps.",
        "f) Python code for that AI algorithm",
        true,
    ),
    (
        "7. Identify a specific Kaggle dataset (or library) that could be used to train the AI model, and explain how it relates to this pricing model.",
        "g) Kaggle dataset (or library) that could be used to train the AI model",
        false,
    ),
    (
        "8. Summarize the key findings of this paper in one paragraph, focusing on how the model differs from others of its time.",
        "h) Key findings",
        false,
    ),
];

/// One fixed analysis prompt, shared read-only across all workers.
#[derive(Debug, Clone)]
pub struct Demand {
    /// 1-based position in the catalog; also the result file index.
    pub index: usize,
    /// Prompt text sent to the completion API.
    pub text: String,
    /// Subsection heading the response renders under in the report.
    pub label: String,
    /// Whether the response is code and should render as a code block.
    pub code: bool,
}

/// Ordered, immutable list of demands applied to every paper.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    demands: Vec<Demand>,
}

impl PromptCatalog {
    /// The standard eight-demand catalog of the pricing-model study.
    pub fn standard() -> Self {
        let demands = STANDARD_DEMANDS
            .iter()
            .enumerate()
            .map(|(i, (text, label, code))| Demand {
                index: i + 1,
                text: (*text).to_string(),
                label: (*label).to_string(),
                code: *code,
            })
            .collect();
        Self { demands }
    }

    /// Build a catalog from explicit demands (used by tests and custom runs).
    pub fn new(demands: Vec<Demand>) -> Self {
        Self { demands }
    }

    /// The demands in catalog order.
    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }

    /// Number of demands in the catalog.
    pub fn len(&self) -> usize {
        self.demands.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.demands.is_empty()
    }
}

/// Truncate `text` to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the combined user prompt for one (demand, paper) pair.
///
/// Paper text is truncated to `char_budget` characters to respect upstream
/// token limits.
pub fn demand_prompt(demand: &Demand, title: &str, paper_text: &str, char_budget: usize) -> String {
    format!(
        "Paper title: {}\n\nDemand {}:\n{}\n\nPaper content:\n{}",
        title,
        demand.index,
        demand.text,
        truncate_chars(paper_text, char_budget)
    )
}
