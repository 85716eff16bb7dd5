//! Mock text provider for tests.
//!
//! The workflow fans out concurrent calls, so responses cannot be a simple
//! consumed-in-order queue: rules match on prompt content instead, making
//! the mock deterministic regardless of branch scheduling.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockTextGenerator::new()
//!     .on("children's story writer", r#"{"content": "Once upon a time"}"#)
//!     .fail_on("story editor", MockFailure::Unavailable)
//!     .with_default("{}");
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::ports::{GenerationRequest, TextGenError, TextGenerator};

/// Failures the mock can inject.
#[derive(Debug, Clone)]
pub enum MockFailure {
    RateLimited,
    Unavailable,
    AuthenticationFailed,
    Network,
    Timeout,
}

impl From<&MockFailure> for TextGenError {
    fn from(failure: &MockFailure) -> Self {
        match failure {
            MockFailure::RateLimited => TextGenError::rate_limited(30),
            MockFailure::Unavailable => TextGenError::unavailable("mock unavailable"),
            MockFailure::AuthenticationFailed => TextGenError::AuthenticationFailed,
            MockFailure::Network => TextGenError::network("mock network error"),
            MockFailure::Timeout => TextGenError::Timeout { timeout_secs: 1 },
        }
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(MockFailure),
}

#[derive(Debug, Clone)]
struct Rule {
    needle: String,
    reply: Reply,
}

/// Rule-based mock text generator.
///
/// The first rule whose needle is a substring of the prompt wins; prompts
/// matching no rule get the default reply (an empty JSON object unless
/// overridden).
#[derive(Debug, Clone)]
pub struct MockTextGenerator {
    rules: Arc<Mutex<Vec<Rule>>>,
    default_reply: Arc<Mutex<Reply>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl Default for MockTextGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextGenerator {
    /// Creates a mock with no rules and an empty-object default reply.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            default_reply: Arc::new(Mutex::new(Reply::Text("{}".to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a rule: prompts containing `needle` get `reply`.
    pub fn on(self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.into(),
            reply: Reply::Text(reply.into()),
        });
        self
    }

    /// Adds a failure rule: prompts containing `needle` get an error.
    pub fn fail_on(self, needle: impl Into<String>, failure: MockFailure) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.into(),
            reply: Reply::Failure(failure),
        });
        self
    }

    /// Overrides the default reply for unmatched prompts.
    pub fn with_default(self, reply: impl Into<String>) -> Self {
        *self.default_reply.lock().unwrap() = Reply::Text(reply.into());
        self
    }

    /// Makes unmatched prompts fail.
    pub fn with_default_failure(self, failure: MockFailure) -> Self {
        *self.default_reply.lock().unwrap() = Reply::Failure(failure);
        self
    }

    /// Recorded requests, for verification.
    pub fn calls(&self) -> Arc<Mutex<Vec<GenerationRequest>>> {
        Arc::clone(&self.calls)
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|rule| prompt.contains(&rule.needle))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| self.default_reply.lock().unwrap().clone())
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, TextGenError> {
        let reply = self.reply_for(&request.prompt);
        self.calls.lock().unwrap().push(request);

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Failure(failure) => Err((&failure).into()),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
