//! Anthropic text provider - messages API client.
//!
//! The messages API has no native JSON response mode; requests with
//! `want_json` rely on the prompt contract plus the callers' lenient
//! extraction.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{GenerationRequest, TextGenError, TextGenerator};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-3-5-haiku-latest".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic messages-API text generator.
pub struct AnthropicTextGenerator {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicTextGenerator {
    /// Creates a new provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn to_wire_request(&self, request: &GenerationRequest) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> TextGenError {
        if err.is_timeout() {
            TextGenError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else {
            TextGenError::network(err.to_string())
        }
    }
}

fn map_status(status: StatusCode, body: &str) -> TextGenError {
    match status.as_u16() {
        429 => TextGenError::rate_limited(30),
        401 | 403 => TextGenError::AuthenticationFailed,
        529 => TextGenError::unavailable("overloaded"),
        s if status.is_server_error() => TextGenError::unavailable(format!("{s}: {body}")),
        s => TextGenError::unavailable(format!("unexpected status {s}: {body}")),
    }
}

#[async_trait]
impl TextGenerator for AnthropicTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, TextGenError> {
        let wire = self.to_wire_request(&request);

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(&wire)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| TextGenError::malformed(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
            })
            .collect();

        if text.is_empty() {
            return Err(TextGenError::malformed("response carried no text blocks"));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_request_carries_prompt_as_user_message() {
        let provider = AnthropicTextGenerator::new(AnthropicConfig::new("key"));
        let wire = provider.to_wire_request(
            &GenerationRequest::new("tell a story")
                .with_temperature(0.8)
                .with_max_output_tokens(500),
        );

        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.messages[0].role, "user");
        assert_eq!(wire.messages[0].content, "tell a story");
        assert_eq!(wire.max_tokens, 500);
    }

    #[test]
    fn status_mapping_classifies_errors() {
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, ""),
            TextGenError::RateLimited { .. }
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, ""),
            TextGenError::AuthenticationFailed
        ));
        assert!(map_status(StatusCode::from_u16(529).unwrap(), "").is_retryable());
    }

    #[test]
    fn response_parsing_joins_text_blocks() {
        let body = r#"{"content": [{"type": "text", "text": "Once"}, {"type": "text", "text": " upon"}]}"#;
        let parsed: WireResponse = serde_json::from_str(body).unwrap();
        let text: String = parsed
            .content
            .into_iter()
            .map(|ContentBlock::Text { text }| text)
            .collect();
        assert_eq!(text, "Once upon");
    }
}
