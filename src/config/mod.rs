//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `STORYLOOM` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use storyloom::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod ai;
mod error;
mod image;
mod redis;
mod server;

pub use ai::{AiConfig, AiProvider};
pub use error::{ConfigError, ValidationError};
pub use image::ImageConfig;
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, CORS).
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration (session store).
    #[serde(default)]
    pub redis: RedisConfig,

    /// Text provider configuration.
    #[serde(default)]
    pub ai: AiConfig,

    /// Image provider configuration.
    #[serde(default)]
    pub image: ImageConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// 1. Loads a `.env` file if present (development)
    /// 2. Reads environment variables with the `STORYLOOM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `STORYLOOM__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `STORYLOOM__AI__OPENAI_API_KEY=sk-...` -> `ai.openai_api_key = ...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("STORYLOOM")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Validates every configuration section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.redis.validate()?;
        self.ai.validate()?;
        self.image.validate(self.ai.has_openai())?;
        Ok(())
    }
}
