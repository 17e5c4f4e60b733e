//! Anthropic Claude oracle implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    secrets::{ApiCredential, CredentialSource},
    ChatMessage, CompletionConfig, CompletionResponse, LlmOracle, OracleError, TokenUsage,
};

/// Environment variable name for the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic Claude oracle.
///
/// The API key is stored as an [`ApiCredential`]: redacted in Debug,
/// zeroed on drop, exposed only when the request header is built.
pub struct AnthropicOracle {
    credential: ApiCredential,
    base_url: String,
}

impl std::fmt::Debug for AnthropicOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicOracle")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicOracle {
    /// Create an oracle with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            credential: ApiCredential::new(
                api_key,
                CredentialSource::Programmatic,
                "Anthropic API key",
            ),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, OracleError> {
        let credential = ApiCredential::from_env(ANTHROPIC_API_KEY_ENV, "Anthropic API key")?;
        Ok(Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn client(&self) -> &reqwest::Client {
        static CLIENT: std::sync::OnceLock<reqwest::Client> = std::sync::OnceLock::new();
        CLIENT.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("failed to build HTTP client")
        })
    }
}

/// Anthropic API request format.
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Anthropic API response format.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)] // required for deserialization, not read directly
    type_: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    #[allow(dead_code)] // required for deserialization, not read directly
    type_: String,
    message: String,
}

#[async_trait]
impl LlmOracle for AnthropicOracle {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, OracleError> {
        let request = AnthropicRequest {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            messages,
            temperature: Some(config.temperature),
        };

        // The credential is exposed only here, at the point of use.
        let response = self
            .client()
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(config.timeout)
                } else {
                    OracleError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(OracleError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = match response.json::<AnthropicError>().await {
                Ok(body) => body.error.message,
                Err(e) => format!("unreadable error body: {e}"),
            };
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| OracleError::ParseError(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
            },
            model: body.model,
            stop_reason: body.stop_reason,
        })
    }

    async fn health_check(&self) -> bool {
        // Verifies the key is present without logging its value.
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_creation() {
        let oracle = AnthropicOracle::new("test-key");
        assert_eq!(oracle.name(), "anthropic");
    }

    #[test]
    fn test_token_estimation() {
        let oracle = AnthropicOracle::new("test-key");
        let estimate = oracle.estimate_tokens("Hello, world!"); // 13 chars
        assert!((2..=5).contains(&estimate));
    }

    #[tokio::test]
    async fn test_health_check_requires_key() {
        assert!(AnthropicOracle::new("test-key").health_check().await);
        assert!(!AnthropicOracle::new("").health_check().await);
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret_key = "sk-ant-REDACTED";
        let oracle = AnthropicOracle::new(secret_key);
        let debug_output = format!("{oracle:?}");

        assert!(
            !debug_output.contains(secret_key),
            "API key was exposed in Debug output"
        );
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[test]
    fn test_custom_base_url() {
        let oracle = AnthropicOracle::new("key").with_base_url("https://proxy.internal/v1");
        assert_eq!(oracle.base_url, "https://proxy.internal/v1");
    }
}
