//! Configuration error types.

use thiserror::Error;

/// Errors loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying configuration source error.
    #[error("Configuration error: {0}")]
    Source(#[from] config::ConfigError),

    /// Configuration loaded but failed validation.
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for loaded configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value is missing.
    #[error("Missing required configuration: {0}")]
    MissingRequired(&'static str),

    /// The Redis URL is not a redis:// or rediss:// URL.
    #[error("Invalid Redis URL: must start with redis:// or rediss://")]
    InvalidRedisUrl,

    /// No text provider has an API key configured.
    #[error("No AI provider configured: set an OpenAI or Anthropic API key")]
    NoAiProviderConfigured,

    /// The server port is invalid.
    #[error("Invalid server port: {0}")]
    InvalidPort(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_display_usefully() {
        assert!(ValidationError::MissingRequired("OPENAI_API_KEY")
            .to_string()
            .contains("OPENAI_API_KEY"));
        assert!(ValidationError::InvalidRedisUrl.to_string().contains("redis://"));
    }
}
