/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock backend that simulates different behaviors:
 * - `MockProvider::working()` - Always answers with one result per image
 * - `MockProvider::count_mismatch(n)` - Drops the last `n` results
 * - `MockProvider::overloaded()` - Answers with a "high load" notice
 * - `MockProvider::failing()` - Always fails with a transport error
 */

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::ocr::OcrImage;
use crate::providers::Provider;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// Images in submission order
    pub images: Vec<OcrImage>,
    /// Recognition instructions
    pub instructions: String,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Raw response body
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one entry per image
    Working,
    /// Succeeds but omits the last `missing` entries
    CountMismatch { missing: usize },
    /// Returns text that is not JSON
    Malformed,
    /// Returns text that is not JSON for the first `failures` requests, then works
    MalformedFirst { failures: usize },
    /// Returns an overload notice in a successful response
    Overloaded,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Fails the first `failures` requests, then works
    FailFirst { failures: usize },
    /// Always fails with a transport error
    Failing,
    /// Always rejects the credentials
    AuthFailure,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing OCR behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom text generator (optional)
    custom_response: Option<fn(&OcrImage) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that returns `missing` fewer results than images
    pub fn count_mismatch(missing: usize) -> Self {
        Self::new(MockBehavior::CountMismatch { missing })
    }

    /// Create a mock that returns non-JSON text
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock that answers in prose a fixed number of times before working
    pub fn malformed_first(failures: usize) -> Self {
        Self::new(MockBehavior::MalformedFirst { failures })
    }

    /// Create a mock that reports high load
    pub fn overloaded() -> Self {
        Self::new(MockBehavior::Overloaded)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a mock that fails a fixed number of times before working
    pub fn fail_first(failures: usize) -> Self {
        Self::new(MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rejects authentication
    pub fn auth_failure() -> Self {
        Self::new(MockBehavior::AuthFailure)
    }

    /// Set a custom text generator
    pub fn with_custom_response(mut self, generator: fn(&OcrImage) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests received so far, across clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn text_for(&self, image: &OcrImage) -> String {
        match self.custom_response {
            Some(generator) => generator(image),
            None => format!("[OCR] {}", image.name),
        }
    }

    /// Generate a well-formed response body for the first `count` images
    pub fn generate_response(&self, images: &[OcrImage], count: usize) -> String {
        let entries: Vec<_> = images
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, image)| {
                json!({
                    "image_order": i + 1,
                    "extracted_text": self.text_for(image),
                })
            })
            .collect();

        serde_json::Value::Array(entries).to_string()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let all = request.images.len();

        let text = match self.behavior {
            MockBehavior::Working => self.generate_response(&request.images, all),

            MockBehavior::CountMismatch { missing } => {
                self.generate_response(&request.images, all.saturating_sub(missing))
            }

            MockBehavior::Malformed => "I can see some subtitles in these images.".to_string(),

            MockBehavior::MalformedFirst { failures } => {
                if count < failures {
                    "I can see some subtitles in these images.".to_string()
                } else {
                    self.generate_response(&request.images, all)
                }
            }

            MockBehavior::Overloaded => {
                "The model is currently experiencing high load. Please retry.".to_string()
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    return Err(ProviderError::Transport(format!(
                        "Simulated intermittent failure (request #{})",
                        count + 1
                    )));
                }
                self.generate_response(&request.images, all)
            }

            MockBehavior::FailFirst { failures } => {
                if count < failures {
                    return Err(ProviderError::Transport(format!(
                        "Simulated failure (request #{})",
                        count + 1
                    )));
                }
                self.generate_response(&request.images, all)
            }

            MockBehavior::Failing => {
                return Err(ProviderError::Transport(
                    "Simulated provider failure".to_string(),
                ));
            }

            MockBehavior::AuthFailure => {
                return Err(ProviderError::Authentication(
                    "Simulated invalid API key".to_string(),
                ));
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.generate_response(&request.images, all)
            }
        };

        Ok(MockResponse { text })
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
