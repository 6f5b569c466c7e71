//! paperforge: batch LLM analysis of research papers.
//!
//! This library discovers papers from a folder or a remote library, extracts
//! their text, runs a fixed set of analysis demands against each one through
//! a chat-completion API, and assembles the stored results into a single
//! report with bibliographic citations.

// Core modules
pub mod cli;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod source;
pub mod store;

// Re-export commonly used error types
pub use error::{ExtractError, LlmError, MetadataError, SourceError};
