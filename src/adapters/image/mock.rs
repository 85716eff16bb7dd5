//! Mock image provider for tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::story::ImageHandle;
use crate::ports::{ImageGenError, ImageGenerator};

/// Failures the mock can inject.
#[derive(Debug, Clone)]
pub enum MockImageFailure {
    Unavailable,
    NoImage,
}

impl From<&MockImageFailure> for ImageGenError {
    fn from(failure: &MockImageFailure) -> Self {
        match failure {
            MockImageFailure::Unavailable => ImageGenError::unavailable("mock unavailable"),
            MockImageFailure::NoImage => ImageGenError::no_image("mock empty response"),
        }
    }
}

/// Mock image generator.
///
/// By default every description succeeds with a URL derived from the
/// description, so concurrent branches stay distinguishable in assertions.
/// Failure rules match on description substrings.
#[derive(Debug, Clone, Default)]
pub struct MockImageGenerator {
    failures: Arc<Mutex<Vec<(String, MockImageFailure)>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockImageGenerator {
    /// Creates a mock where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a failure rule: descriptions containing `needle` get an error.
    pub fn fail_on(self, needle: impl Into<String>, failure: MockImageFailure) -> Self {
        self.failures.lock().unwrap().push((needle.into(), failure));
        self
    }

    /// Recorded descriptions, for verification.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(&self, description: &str) -> Result<ImageHandle, ImageGenError> {
        self.calls.lock().unwrap().push(description.to_string());

        let failures = self.failures.lock().unwrap();
        if let Some((_, failure)) = failures
            .iter()
            .find(|(needle, _)| description.contains(needle))
        {
            return Err(failure.into());
        }

        let slug: String = description
            .chars()
            .take(24)
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        Ok(ImageHandle::new(format!("mock://image/{slug}")))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
