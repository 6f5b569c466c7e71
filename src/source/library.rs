//! Remote library discovery (Mendeley-style API).
//!
//! Lists documents page by page until an empty page is returned, optionally
//! restricted to one collection, and resolves each document's first file
//! reference to a download URL via a secondary GET. Documents without a file
//! or without a resolvable download URL are skipped silently.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::SourceError;
use crate::source::Paper;

/// Default library API endpoint.
const LIBRARY_BASE_URL: &str = "https://api.mendeley.com";

/// Page size for document listings.
const PAGE_LIMIT: usize = 50;

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the remote library listing API.
pub struct LibraryClient {
    /// HTTP client for making API requests.
    client: Client,
    /// Access token for bearer authentication.
    token: String,
    /// Base URL for the API.
    base_url: String,
}

impl LibraryClient {
    /// Create a new library client with the given access token.
    pub fn new(token: String) -> Self {
        Self::with_custom_url(token, LIBRARY_BASE_URL.to_string())
    }

    /// Create a new library client with a custom base URL (for tests).
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

    /// Resolve a collection name to its identifier.
    pub async fn resolve_collection(&self, name: &str) -> Result<String, SourceError> {
        let url = format!("{}/folders", self.base_url);
        let collections: Vec<CollectionRecord> = self.get_json(&url).await?;

        collections
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .ok_or_else(|| SourceError::CollectionNotFound(name.to_string()))
    }

    /// List all papers with a resolvable download URL.
    ///
    /// Paginates until the API returns an empty page. `collection_id`
    /// restricts the listing to one collection.
    pub async fn list_papers(&self, collection_id: Option<&str>) -> Result<Vec<Paper>, SourceError> {
        let base = match collection_id {
            Some(id) => format!("{}/folders/{}/documents", self.base_url, id),
            None => format!("{}/documents", self.base_url),
        };

        let mut papers = Vec::new();
        let mut page = 1usize;

        loop {
            let url = format!("{}?limit={}&page={}", base, PAGE_LIMIT, page);
            let documents: Vec<DocumentRecord> = self.get_json(&url).await?;
            if documents.is_empty() {
                break;
            }

            for document in documents {
                let Some(file) = document.files.into_iter().flatten().next() else {
                    continue;
                };

                let file_url = format!("{}/files/{}", self.base_url, file.id);
                let info: FileRecord = self.get_json(&file_url).await?;

                if let Some(download_url) = info.download_url {
                    let title = document
                        .title
                        .unwrap_or_else(|| "Untitled".to_string());
                    papers.push(Paper::remote(title, download_url));
                } else {
                    tracing::debug!(file_id = %file.id, "File has no download URL, skipping");
                }
            }

            page += 1;
        }

        Ok(papers)
    }

    /// Authenticated GET returning deserialized JSON.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| SourceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(SourceError::ApiError {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))
    }
}

/// One collection record from `/folders`.
#[derive(Debug, Deserialize)]
struct CollectionRecord {
    id: String,
    name: String,
}

/// One document record from a listing page.
#[derive(Debug, Deserialize)]
struct DocumentRecord {
    title: Option<String>,
    files: Option<Vec<FileReference>>,
}

/// A file reference attached to a document.
#[derive(Debug, Deserialize)]
struct FileReference {
    id: String,
}

/// File details from the secondary lookup.
#[derive(Debug, Deserialize)]
struct FileRecord {
    download_url: Option<String>,
}
