//! Text generation port - interface to LLM providers.
//!
//! The workflow nodes are prompt-in, text-out: they build one prompt, make
//! one call, and post-process the raw text themselves (JSON extraction is a
//! caller concern, see `domain::story::extract_object`). Providers translate
//! this contract to their own wire APIs.

use async_trait::async_trait;

/// A single text-generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The full prompt, already rendered.
    pub prompt: String,
    /// Sampling temperature (0.0 = deterministic).
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Ask the provider for a JSON object response where supported.
    ///
    /// Callers must still extract the object leniently; this flag is a hint,
    /// not a guarantee.
    pub want_json: bool,
}

impl GenerationRequest {
    /// Creates a request with the default sampling settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.7,
            max_output_tokens: 1024,
            want_json: false,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the output token bound.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    /// Requests a JSON object response.
    pub fn json(mut self) -> Self {
        self.want_json = true;
        self
    }
}

/// Port for text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the request, suspending until the provider
    /// responds or fails.
    async fn generate(&self, request: GenerationRequest) -> Result<String, TextGenError>;

    /// Short provider name for logging ("openai", "anthropic", "mock").
    fn provider_name(&self) -> &str;
}

/// Text provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TextGenError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider returned a response the adapter could not read.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl TextGenError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// True if retrying (or falling back to another provider) may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TextGenError::RateLimited { .. }
                | TextGenError::Unavailable { .. }
                | TextGenError::Network(_)
                | TextGenError::Timeout { .. }
        )
    }
}
