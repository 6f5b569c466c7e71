//! Bibliographic metadata lookups.
//!
//! Each paper title is searched against a Mendeley-style metadata API. A
//! lookup that fails or matches nothing degrades to `None`; citation
//! formatting falls back downstream. Lookups for a whole run fan out under a
//! small bounded pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::MetadataError;

/// Default metadata search endpoint base.
const METADATA_BASE_URL: &str = "https://api.mendeley.com";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Concurrent lookups in flight at once.
const LOOKUP_POOL_SIZE: usize = 5;

/// Bibliographic record for one paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperMetadata {
    /// Canonical title from the metadata service.
    pub title: String,
    /// Author display names, in listing order.
    pub authors: Vec<String>,
    /// Publication year, empty when unknown.
    pub year: String,
    /// Journal or venue name, empty when unknown.
    pub source: String,
}

/// Trait for looking up bibliographic metadata by title.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Search for the best match for `title`.
    ///
    /// `Ok(None)` means the search succeeded but matched nothing.
    async fn search(&self, title: &str) -> Result<Option<PaperMetadata>, MetadataError>;
}

/// Metadata client for the Mendeley search API.
pub struct MendeleyClient {
    client: Client,
    token: String,
    base_url: String,
}

impl MendeleyClient {
    /// Create a new metadata client with the given access token.
    pub fn new(token: String) -> Self {
        Self::with_custom_url(token, METADATA_BASE_URL.to_string())
    }

    /// Create a new metadata client with a custom base URL (for tests).
    pub fn with_custom_url(token: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client - system TLS configuration error"),
            token,
            base_url,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetadataLookup for MendeleyClient {
    async fn search(&self, title: &str) -> Result<Option<PaperMetadata>, MetadataError> {
        let url = format!(
            "{}/search/documents?title={}&limit=1",
            self.base_url,
            urlencoding::encode(title)
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| MetadataError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(MetadataError::ApiError {
                code: status.as_u16(),
                message,
            });
        }

        let documents: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| MetadataError::ParseError(e.to_string()))?;

        Ok(documents
            .into_iter()
            .next()
            .map(|doc| doc.into_metadata(title)))
    }
}

/// One search hit from the metadata API.
#[derive(Debug, Deserialize)]
struct SearchResult {
    title: Option<String>,
    authors: Option<Vec<AuthorRecord>>,
    year: Option<i32>,
    source: Option<String>,
    journal: Option<String>,
}

impl SearchResult {
    /// Convert a search hit into a [`PaperMetadata`] record.
    ///
    /// `journal` is the venue fallback for records that carry it instead of
    /// `source`; `fallback_title` fills in when the hit has no title.
    fn into_metadata(self, fallback_title: &str) -> PaperMetadata {
        let authors = self
            .authors
            .into_iter()
            .flatten()
            .filter_map(|a| match (a.first_name, a.last_name) {
                (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                (None, Some(last)) => Some(last),
                _ => None,
            })
            .collect();

        PaperMetadata {
            title: self.title.unwrap_or_else(|| fallback_title.to_string()),
            authors,
            year: self.year.map(|y| y.to_string()).unwrap_or_default(),
            source: self.source.or(self.journal).unwrap_or_default(),
        }
    }
}

/// Author entry within a search hit.
#[derive(Debug, Deserialize)]
struct AuthorRecord {
    first_name: Option<String>,
    last_name: Option<String>,
}

/// Look up metadata for every title, at most [`LOOKUP_POOL_SIZE`] in flight.
///
/// Returns one entry per title in input order. A failed lookup is logged and
/// degrades to `None`, it never aborts report assembly.
pub async fn fetch_all(
    lookup: Arc<dyn MetadataLookup>,
    titles: &[String],
) -> Vec<Option<PaperMetadata>> {
    let pool = Arc::new(Semaphore::new(LOOKUP_POOL_SIZE));

    let mut handles = Vec::with_capacity(titles.len());
    for title in titles {
        let lookup = Arc::clone(&lookup);
        let pool = Arc::clone(&pool);
        let title = title.clone();
        handles.push(tokio::spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .expect("metadata pool semaphore closed");
            match lookup.search(&title).await {
                Ok(meta) => {
                    debug!(title = %title, found = meta.is_some(), "Metadata lookup finished");
                    meta
                }
                Err(e) => {
                    warn!(title = %title, error = %e, "Metadata lookup failed");
                    None
                }
            }
        }));
    }

    futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|result| {
            result.unwrap_or_else(|e| {
                warn!(error = %e, "Metadata lookup task failed");
                None
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLookup;

    #[async_trait]
    impl MetadataLookup for FixedLookup {
        async fn search(&self, title: &str) -> Result<Option<PaperMetadata>, MetadataError> {
            if title == "known" {
                Ok(Some(PaperMetadata {
                    title: "Known Paper".to_string(),
                    authors: vec!["Ada Lovelace".to_string()],
                    year: "1996".to_string(),
                    source: "Journal of Pricing".to_string(),
                }))
            } else if title == "error" {
                Err(MetadataError::RequestFailed("boom".to_string()))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn test_search_result_deserialization() {
        let json = r#"{
            "title": "A Paper",
            "authors": [
                {"first_name": "Ada", "last_name": "Lovelace"},
                {"last_name": "Turing"},
                {"first_name": "Orphan"}
            ],
            "year": 1998,
            "source": "Netnomics"
        }"#;

        let doc: SearchResult = serde_json::from_str(json).expect("valid hit");
        assert_eq!(doc.title.as_deref(), Some("A Paper"));
        assert_eq!(doc.year, Some(1998));
        assert_eq!(doc.authors.as_ref().unwrap().len(), 3);

        let meta = doc.into_metadata("fallback");
        assert_eq!(meta.title, "A Paper");
        assert_eq!(meta.authors, vec!["Ada Lovelace", "Turing"]);
        assert_eq!(meta.year, "1998");
        assert_eq!(meta.source, "Netnomics");
    }

    #[test]
    fn test_journal_is_venue_fallback() {
        let json = r#"{"title": "B Paper", "journal": "ACM SIGCOMM"}"#;
        let doc: SearchResult = serde_json::from_str(json).expect("valid hit");
        assert_eq!(doc.into_metadata("fallback").source, "ACM SIGCOMM");

        // An explicit source wins over journal.
        let json = r#"{"title": "C Paper", "source": "Netnomics", "journal": "ACM SIGCOMM"}"#;
        let doc: SearchResult = serde_json::from_str(json).expect("valid hit");
        assert_eq!(doc.into_metadata("fallback").source, "Netnomics");
    }

    #[tokio::test]
    async fn test_fetch_all_preserves_order_and_degrades() {
        let titles = vec![
            "known".to_string(),
            "error".to_string(),
            "missing".to_string(),
        ];
        let results = fetch_all(Arc::new(FixedLookup), &titles).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().title, "Known Paper");
        assert!(results[1].is_none());
        assert!(results[2].is_none());
    }

    #[tokio::test]
    async fn test_connection_error_surfaces_as_request_failed() {
        let client =
            MendeleyClient::with_custom_url("token".to_string(), "http://localhost:65535".to_string());
        let result = client.search("anything").await;
        assert!(matches!(result, Err(MetadataError::RequestFailed(_))));
    }

    #[test]
    fn test_client_urls() {
        let client = MendeleyClient::new("t".to_string());
        assert_eq!(client.base_url(), METADATA_BASE_URL);
    }
}
