//! Image generation port - interface to image providers.

use async_trait::async_trait;

use crate::domain::story::ImageHandle;

/// Port for image generation.
///
/// One English-language scene description in, one opaque [`ImageHandle`]
/// out. The core never interprets the handle.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image for the description.
    async fn generate(&self, description: &str) -> Result<ImageHandle, ImageGenError>;

    /// Short provider name for logging.
    fn provider_name(&self) -> &str;
}

/// Image provider errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageGenError {
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

    /// Provider response carried no usable image.
    #[error("no image in provider response: {0}")]
    NoImage(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl ImageGenError {
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

    /// Creates a no-image error.
    pub fn no_image(message: impl Into<String>) -> Self {
        Self::NoImage(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ImageGenerator) {}

    #[test]
    fn errors_display_usefully() {
        assert_eq!(
            ImageGenError::no_image("empty data array").to_string(),
            "no image in provider response: empty data array"
        );
        assert_eq!(
            ImageGenError::unavailable("overloaded").to_string(),
            "provider unavailable: overloaded"
        );
    }
}
