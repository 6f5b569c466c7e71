//! LLM integration for paperforge.
//!
//! Provides the completion-client seam used by the paper pipeline and the
//! report synthesizer, plus the DeepSeek implementation with bounded retry.
//!
//! ```ignore
//! use paperforge::llm::{CompletionClient, CompletionRequest, DeepSeekClient};
//! use paperforge::llm::retry::RetryPolicy;
//!
//! let client = DeepSeekClient::new("sk-...".to_string(), RetryPolicy::default());
//! let request = CompletionRequest::new("You are a research assistant.", "Summarize...")
//!     .with_temperature(0.3)
//!     .with_max_tokens(4000);
//! let text = client.complete(request).await?;
//! ```

pub mod deepseek;
pub mod retry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

pub use deepseek::DeepSeekClient;
pub use retry::RetryPolicy;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request: one system instruction plus one user prompt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction for the call.
    pub system: String,
    /// Combined user prompt (demand text plus truncated paper content).
    pub user: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Create a new request with default sampling parameters.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.3,
            max_tokens: 4000,
        }
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens for this request.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The request rendered as a message list for an OpenAI-style API.
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message::system(self.system.clone()),
            Message::user(self.user.clone()),
        ]
    }
}

/// Trait for clients that can run one completion call.
///
/// Implementations own their retry behavior: a returned error is terminal for
/// the (paper, demand) pair, the caller never re-issues the call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are helpful.");
        assert_eq!(system.role, "system");
        assert_eq!(system.content, "You are helpful.");

        let user = Message::user("Hello");
        assert_eq!(user.role, "user");
        assert_eq!(user.content, "Hello");
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("sys", "usr")
            .with_temperature(0.7)
            .with_max_tokens(1000);

        assert_eq!(request.system, "sys");
        assert_eq!(request.user, "usr");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 1000);
    }

    #[test]
    fn test_completion_request_messages() {
        let request = CompletionRequest::new("sys", "usr");
        let messages = request.messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "sys");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "usr");
    }
}
