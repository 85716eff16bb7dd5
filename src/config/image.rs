//! Image provider configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Image provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    /// API key for the image provider (falls back to the OpenAI text key
    /// at wiring time when unset).
    pub api_key: Option<String>,

    /// Image model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Generated image size.
    #[serde(default = "default_size")]
    pub size: String,

    /// Style suffix appended to every image prompt for a consistent look.
    #[serde(default = "default_style_suffix")]
    pub style_suffix: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ImageConfig {
    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate image configuration given whether a text-provider OpenAI
    /// key exists to fall back on.
    pub fn validate(&self, has_openai_key: bool) -> Result<(), ValidationError> {
        let has_own_key = self.api_key.as_ref().is_some_and(|k| !k.is_empty());
        if !has_own_key && !has_openai_key {
            return Err(ValidationError::MissingRequired("IMAGE_API_KEY"));
        }
        Ok(())
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            size: default_size(),
            style_suffix: default_style_suffix(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "dall-e-3".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_style_suffix() -> String {
    "children's book illustration, no text in the image".to_string()
}

fn default_timeout() -> u64 {
    120
}
