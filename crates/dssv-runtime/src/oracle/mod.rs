//! Oracle abstractions for dssv-runtime.
//!
//! The reasoning oracle is an opaque external collaborator reached
//! through the [`LlmOracle`] trait. The pipeline never depends on a
//! concrete vendor; test doubles implement the same trait.
//!
//! ## Security
//!
//! All implementations use the [`secrets`] module for credential
//! handling. See [`ApiCredential`] for the patterns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod anthropic;
pub mod secrets;

pub use anthropic::{AnthropicOracle, ANTHROPIC_API_KEY_ENV};
pub use secrets::{ApiCredential, CredentialSource};

/// Errors from oracle transports.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

/// Configuration for a single completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 for deterministic output)
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-haiku-20240307".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A chat message for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "user" or "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Response from a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Token usage
    pub usage: TokenUsage,

    /// Model that produced the response
    pub model: String,

    /// Stop reason, when reported
    pub stop_reason: Option<String>,
}

/// Token usage from one completion.
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,

    /// Tokens in the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Oracle abstraction. The only place in the pipeline that talks to the
/// network; everything downstream of a response is pure.
#[async_trait]
pub trait LlmOracle: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, OracleError>;

    /// Check if the oracle is reachable/configured.
    async fn health_check(&self) -> bool;

    /// Oracle name for metrics and error reports.
    fn name(&self) -> &str;

    /// Estimate tokens for a prompt.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // Simple estimate: ~4 chars per token
        (text.len() / 4) as u32
    }
}
