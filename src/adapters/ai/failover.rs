//! Failover wrapper - automatic fallback between two text providers.
//!
//! When the primary fails with a transient error (rate limit, unavailable,
//! network, timeout), the request is retried once on the fallback provider
//! if one is configured. Non-transient errors propagate immediately.

use async_trait::async_trait;

use crate::ports::{GenerationRequest, TextGenError, TextGenerator};

/// Marker type for when no fallback is configured.
pub struct NoFallback;

#[async_trait]
impl TextGenerator for NoFallback {
    async fn generate(&self, _: GenerationRequest) -> Result<String, TextGenError> {
        unreachable!("NoFallback should never be called")
    }

    fn provider_name(&self) -> &str {
        "none"
    }
}

/// Text generator with automatic failover support.
pub struct FailoverTextGenerator<P: TextGenerator, F: TextGenerator = NoFallback> {
    primary: P,
    fallback: Option<F>,
}

impl<P: TextGenerator> FailoverTextGenerator<P, NoFallback> {
    /// Creates a failover generator with only a primary provider.
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Adds a fallback provider.
    pub fn with_fallback<F: TextGenerator>(self, fallback: F) -> FailoverTextGenerator<P, F> {
        FailoverTextGenerator {
            primary: self.primary,
            fallback: Some(fallback),
        }
    }
}

#[async_trait]
impl<P: TextGenerator + 'static, F: TextGenerator + 'static> TextGenerator
    for FailoverTextGenerator<P, F>
{
    async fn generate(&self, request: GenerationRequest) -> Result<String, TextGenError> {
        match self.primary.generate(request.clone()).await {
            Ok(text) => Ok(text),
            Err(err) if err.is_retryable() && self.fallback.is_some() => {
                let fallback = self.fallback.as_ref().unwrap();
                tracing::warn!(
                    primary = self.primary.provider_name(),
                    fallback = fallback.provider_name(),
                    error = %err,
                    "text provider failover"
                );
                fallback.generate(request).await
            }
            Err(err) => Err(err),
        }
    }

    fn provider_name(&self) -> &str {
        self.primary.provider_name()
    }
}
