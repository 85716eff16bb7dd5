//! Text provider adapters.
//!
//! Two wire clients (OpenAI-style chat completions, Anthropic messages), a
//! failover wrapper that pairs them according to configuration, and a mock
//! for tests.

mod anthropic;
mod failover;
mod mock;
mod openai;

pub use anthropic::{AnthropicConfig, AnthropicTextGenerator};
pub use failover::{FailoverTextGenerator, NoFallback};
pub use mock::{MockFailure, MockTextGenerator};
pub use openai::{OpenAiConfig, OpenAiTextGenerator};
