//! Paper text extraction.
//!
//! The pipeline treats extraction as an external capability behind the
//! [`TextExtractor`] trait: give it the raw bytes of a document, get text or
//! an error. The default implementation wraps the `pdf-extract` crate.
//! Encrypted, scanned, or corrupted PDFs fail here and the paper is skipped
//! by the worker.

use crate::error::ExtractError;

/// Trait for extracting plain text from document bytes.
pub trait TextExtractor: Send + Sync {
    /// Extract text from a document byte buffer.
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// PDF text extractor backed by `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Extraction(e.to_string()))
    }
}
