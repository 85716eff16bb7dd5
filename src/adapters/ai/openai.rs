//! OpenAI text provider - chat completions client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{GenerationRequest, TextGenError, TextGenerator};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    api_key: Secret<String>,
    /// Model to use (e.g. "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
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

/// OpenAI chat-completions text generator.
pub struct OpenAiTextGenerator {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiTextGenerator {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    fn to_wire_request(&self, request: &GenerationRequest) -> WireRequest {
        WireRequest {
            model: self.config.model.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            response_format: request.want_json.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
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
    match status {
        StatusCode::TOO_MANY_REQUESTS => TextGenError::rate_limited(30),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TextGenError::AuthenticationFailed,
        s if s.is_server_error() => TextGenError::unavailable(format!("{s}: {body}")),
        s => TextGenError::unavailable(format!("unexpected status {s}: {body}")),
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, TextGenError> {
        let wire = self.to_wire_request(&request);

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
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

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TextGenError::malformed("response carried no choices"))
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAiConfig::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("http://localhost:9999")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn json_requests_carry_response_format() {
        let provider = OpenAiTextGenerator::new(OpenAiConfig::new("sk-test"));
        let wire = provider.to_wire_request(&GenerationRequest::new("p").json());
        let value = serde_json::to_value(&wire).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn plain_requests_omit_response_format() {
        let provider = OpenAiTextGenerator::new(OpenAiConfig::new("sk-test"));
        let wire = provider.to_wire_request(&GenerationRequest::new("p"));
        let value = serde_json::to_value(&wire).unwrap();
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["content"], "p");
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
        assert!(matches!(
            map_status(StatusCode::SERVICE_UNAVAILABLE, "down"),
            TextGenError::Unavailable { .. }
        ));
    }

    #[test]
    fn response_parsing_reads_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "hello"}}]}"#;
        let parsed: WireResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
