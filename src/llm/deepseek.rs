//! DeepSeek chat-completion client.
//!
//! Talks to the OpenAI-compatible `/chat/completions` endpoint with bearer
//! authentication and bounded retry. HTTP 402 (insufficient balance) is
//! surfaced as [`LlmError::QuotaExhausted`] and never retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;
use crate::llm::retry::{with_backoff, RetryPolicy};
use crate::llm::{CompletionClient, CompletionRequest, Message};

/// Default DeepSeek API endpoint.
const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default model to use if none specified.
const DEFAULT_MODEL: &str = "deepseek-chat";

/// Request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Status code the API uses for exhausted account balance.
const PAYMENT_REQUIRED: u16 = 402;

/// DeepSeek client for completion requests.
pub struct DeepSeekClient {
    /// HTTP client for making API requests.
    client: Client,
    /// API key for bearer authentication.
    api_key: String,
    /// Base URL for the API.
    base_url: String,
    /// Model identifier sent with every request.
    model: String,
    /// Retry policy applied to every call.
    retry: RetryPolicy,
}

impl DeepSeekClient {
    /// Create a new client with the given API key and retry policy.
    pub fn new(api_key: String, retry: RetryPolicy) -> Self {
        Self::with_custom_url(
            api_key,
            DEEPSEEK_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            retry,
        )
    }

    /// Create a new client with custom base URL and model.
    ///
    /// Useful for testing or OpenAI-compatible proxies.
    pub fn with_custom_url(
        api_key: String,
        base_url: String,
        model: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client - system TLS configuration error"),
            api_key,
            base_url,
            model,
            retry,
        }
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        if self.api_key.len() <= 8 {
            "*".repeat(self.api_key.len())
        } else {
            format!(
                "{}...{}",
                &self.api_key[..4],
                &self.api_key[self.api_key.len() - 4..]
            )
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Execute a single request (no retry logic).
    async fn execute_request(&self, url: &str, request: &ApiRequest) -> Result<String, LlmError> {
        let http_response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(parsed) => parsed.error.message,
                Err(_) => error_text,
            };

            if status_code == PAYMENT_REQUIRED {
                return Err(LlmError::QuotaExhausted(message));
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ParseError("No choices in completion response".to_string()))
    }
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let api_request = ApiRequest {
            model: self.model.clone(),
            messages: request.messages(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);

        with_backoff(&self.retry, |_| self.execute_request(&url, &api_request)).await
    }
}

/// Internal request structure for the DeepSeek API.
#[derive(Debug, Clone, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

/// Internal response structure from the DeepSeek API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

/// Internal choice structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

/// Internal message structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
