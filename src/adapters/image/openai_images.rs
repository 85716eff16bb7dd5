//! OpenAI image provider - images API client.
//!
//! Every prompt gets the configured style suffix appended so illustrations
//! across one story (and across stories) share a consistent look.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::story::ImageHandle;
use crate::ports::{ImageGenError, ImageGenerator};

/// Configuration for the OpenAI image provider.
#[derive(Debug, Clone)]
pub struct OpenAiImageConfig {
    api_key: Secret<String>,
    /// Model to use (e.g. "dall-e-3").
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Generated image size.
    pub size: String,
    /// Style suffix appended to every prompt.
    pub style_suffix: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiImageConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "dall-e-3".to_string(),
            base_url: "https://api.openai.com".to_string(),
            size: "1024x1024".to_string(),
            style_suffix: "children's book illustration, no text in the image".to_string(),
            timeout: Duration::from_secs(120),
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

    /// Sets the generated image size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Sets the style suffix.
    pub fn with_style_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.style_suffix = suffix.into();
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

/// OpenAI images-API generator.
pub struct OpenAiImageGenerator {
    config: OpenAiImageConfig,
    client: Client,
}

impl OpenAiImageGenerator {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAiImageConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn generations_url(&self) -> String {
        format!("{}/v1/images/generations", self.config.base_url)
    }

    fn styled_prompt(&self, description: &str) -> String {
        if self.config.style_suffix.is_empty() {
            description.to_string()
        } else {
            format!("{}, {}", description, self.config.style_suffix)
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ImageGenError {
        if err.is_timeout() {
            ImageGenError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else {
            ImageGenError::network(err.to_string())
        }
    }
}

fn map_status(status: StatusCode, body: &str) -> ImageGenError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ImageGenError::RateLimited {
            retry_after_secs: 30,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ImageGenError::AuthenticationFailed,
        s if s.is_server_error() => ImageGenError::unavailable(format!("{s}: {body}")),
        s => ImageGenError::unavailable(format!("unexpected status {s}: {body}")),
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate(&self, description: &str) -> Result<ImageHandle, ImageGenError> {
        let wire = WireRequest {
            model: self.config.model.clone(),
            prompt: self.styled_prompt(description),
            n: 1,
            size: self.config.size.clone(),
        };

        let response = self
            .client
            .post(self.generations_url())
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
            .map_err(|e| ImageGenError::no_image(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|item| item.url)
            .map(ImageHandle::new)
            .ok_or_else(|| ImageGenError::no_image("response carried no image url"))
    }

    fn provider_name(&self) -> &str {
        "openai-images"
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    data: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    url: Option<String>,
}
