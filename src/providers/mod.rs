/*!
 * Provider implementations for different OCR backends.
 *
 * This module contains client implementations for vision-capable model APIs:
 * - OpenAI: OpenAI-compatible chat completions (OpenAI, Gemini, LM Studio)
 * - Anthropic: Anthropic messages API
 * - Ollama: Local Ollama server
 * - Mock: Scripted backend for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all model providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the OCR service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Read a non-success response body and classify it by status
pub(crate) async fn error_from_response(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    log::debug!("{} API error ({}): {}", provider, status, body);
    ProviderError::from_status(status.as_u16(), body)
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
