//! Error types for paperforge operations.
//!
//! Defines error types for the major subsystems:
//! - LLM completion calls (retry classification lives in `llm::retry`)
//! - PDF text extraction
//! - Paper discovery (folder scan, remote library listing)
//! - Bibliographic metadata lookups

use thiserror::Error;

/// Errors that can occur during LLM completion calls.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse completion response: {0}")]
    ParseError(String),

    #[error("Quota exhausted (payment required): {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Completion unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

/// Errors that can occur while obtaining paper text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read document from '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to fetch document from '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Text extraction failed: {0}")]
    Extraction(String),
}

/// Errors that can occur during paper discovery.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Library listing request failed: {0}")]
    RequestFailed(String),

    #[error("Library API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Failed to parse library response: {0}")]
    ParseError(String),

    #[error("Collection '{0}' not found in library")]
    CollectionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during bibliographic metadata lookups.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata request failed: {0}")]
    RequestFailed(String),

    #[error("Metadata API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Failed to parse metadata response: {0}")]
    ParseError(String),
}
