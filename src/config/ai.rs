//! Text provider configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Text provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key.
    pub openai_api_key: Option<String>,

    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,

    /// Primary text provider.
    #[serde(default = "default_provider")]
    pub primary_provider: AiProvider,

    /// Fallback text provider, tried on transient primary failures.
    pub fallback_provider: Option<AiProvider>,

    /// OpenAI model.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Anthropic model.
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Text provider kind.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl AiConfig {
    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when an OpenAI key is configured.
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// True when an Anthropic key is configured.
    pub fn has_anthropic(&self) -> bool {
        self.anthropic_api_key
            .as_ref()
            .is_some_and(|k| !k.is_empty())
    }

    fn has_key_for(&self, provider: AiProvider) -> bool {
        match provider {
            AiProvider::OpenAI => self.has_openai(),
            AiProvider::Anthropic => self.has_anthropic(),
        }
    }

    /// Validate text provider configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() && !self.has_anthropic() {
            return Err(ValidationError::NoAiProviderConfigured);
        }

        if !self.has_key_for(self.primary_provider) {
            return Err(match self.primary_provider {
                AiProvider::OpenAI => ValidationError::MissingRequired("OPENAI_API_KEY"),
                AiProvider::Anthropic => ValidationError::MissingRequired("ANTHROPIC_API_KEY"),
            });
        }

        if let Some(fallback) = self.fallback_provider {
            if !self.has_key_for(fallback) {
                return Err(match fallback {
                    AiProvider::OpenAI => ValidationError::MissingRequired("OPENAI_API_KEY"),
                    AiProvider::Anthropic => ValidationError::MissingRequired("ANTHROPIC_API_KEY"),
                });
            }
        }

        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            primary_provider: default_provider(),
            fallback_provider: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_provider() -> AiProvider {
    AiProvider::OpenAI
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_timeout() -> u64 {
    60
}
