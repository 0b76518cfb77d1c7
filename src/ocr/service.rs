/*!
 * OCR service backed by the configured provider.
 *
 * The provider is selected once from configuration; every request then
 * goes through the single `OcrBackend::recognize` capability.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::app_config::{OcrConfig, OcrProvider};
use crate::errors::ProviderError;
use crate::ocr::prompts::{batch_header, image_label};
use crate::ocr::response::parse_response;
use crate::ocr::{OcrBackend, OcrImage, RecognizedText};
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest, ContentBlock};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{ContentPart, OpenAI, OpenAIRequest};

/// OCR provider implementation variants
#[derive(Debug)]
enum OcrProviderImpl {
    /// Gemini through its OpenAI-compatible endpoint
    Gemini {
        client: OpenAI,
    },

    /// OpenAI API service
    OpenAI {
        client: OpenAI,
    },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio {
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        client: Anthropic,
    },

    /// Ollama local server
    Ollama {
        client: Ollama,
    },

    /// In-process mock for tests and dry runs
    Mock {
        client: MockProvider,
    },
}

/// Recognizes subtitle text through one configured provider
#[derive(Debug)]
pub struct OcrService {
    /// Provider implementation
    provider: OcrProviderImpl,
    /// Which provider was configured
    kind: OcrProvider,
    /// Model name sent with each request
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Output token budget
    max_tokens: u32,
}

impl OcrService {
    /// Create a new OCR service with the given configuration
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.get_timeout_secs());
        let endpoint = config.get_endpoint();

        let provider = match config.provider {
            OcrProvider::Gemini => OcrProviderImpl::Gemini {
                client: OpenAI::new(config.get_api_key(), endpoint, timeout),
            },
            OcrProvider::OpenAI => OcrProviderImpl::OpenAI {
                client: OpenAI::new(config.get_api_key(), endpoint, timeout),
            },
            OcrProvider::LMStudio => {
                // LM Studio accepts any key
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                OcrProviderImpl::LMStudio {
                    client: OpenAI::new(api_key, endpoint, timeout),
                }
            }
            OcrProvider::Anthropic => OcrProviderImpl::Anthropic {
                client: Anthropic::new(config.get_api_key(), endpoint, timeout),
            },
            OcrProvider::Ollama => OcrProviderImpl::Ollama {
                client: Ollama::new(endpoint, timeout),
            },
            OcrProvider::Mock => OcrProviderImpl::Mock {
                client: MockProvider::working(),
            },
        };

        Ok(Self {
            provider,
            kind: config.provider,
            model: config.get_model(),
            temperature: config.common.temperature,
            max_tokens: config.get_max_tokens(),
        })
    }

    /// Create a service around a specific mock
    pub fn with_mock(client: MockProvider) -> Self {
        Self {
            provider: OcrProviderImpl::Mock { client },
            kind: OcrProvider::Mock,
            model: "mock".to_string(),
            temperature: 0.0,
            max_tokens: 0,
        }
    }

    pub fn provider(&self) -> OcrProvider {
        self.kind
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Header text, then a label and the image for each position
    fn openai_request(&self, images: &[OcrImage], instructions: &str, json_mode: bool) -> OpenAIRequest {
        let mut parts = Vec::with_capacity(images.len() * 2 + 1);
        parts.push(ContentPart::text(batch_header(images.len(), instructions)));
        for (i, image) in images.iter().enumerate() {
            parts.push(ContentPart::text(image_label(i + 1)));
            parts.push(ContentPart::image_url(image.data_uri()));
        }

        let request = OpenAIRequest::new(&self.model)
            .add_message("user", parts)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens);

        if json_mode { request.json_response() } else { request }
    }

    fn anthropic_request(&self, images: &[OcrImage], instructions: &str) -> AnthropicRequest {
        let mut blocks = Vec::with_capacity(images.len() * 2 + 1);
        blocks.push(ContentBlock::text(batch_header(images.len(), instructions)));
        for (i, image) in images.iter().enumerate() {
            blocks.push(ContentBlock::text(image_label(i + 1)));
            blocks.push(ContentBlock::image(&image.mime_type, &image.data));
        }

        AnthropicRequest::new(&self.model, self.max_tokens)
            .add_message("user", blocks)
            .temperature(self.temperature)
    }

    /// Ollama takes images as a flat list, so positions are stated in the prompt
    fn ollama_request(&self, images: &[OcrImage], instructions: &str) -> GenerationRequest {
        let mut prompt = batch_header(images.len(), instructions);
        prompt.push_str(&format!(
            "\nThe {} images are attached in order: {} is the first attached image.",
            images.len(),
            image_label(1).trim_end_matches(':')
        ));

        GenerationRequest::new(&self.model, prompt)
            .images(images.iter().map(|image| image.data.clone()).collect())
            .temperature(self.temperature)
            .num_predict(self.max_tokens)
            .format("json")
    }
}

#[async_trait]
impl OcrBackend for OcrService {
    async fn recognize(
        &self,
        images: &[OcrImage],
        instructions: &str,
    ) -> Result<Vec<RecognizedText>, ProviderError> {
        let raw = match &self.provider {
            OcrProviderImpl::Gemini { client } | OcrProviderImpl::OpenAI { client } => {
                let response = client.complete(self.openai_request(images, instructions, true)).await?;
                OpenAI::extract_text(&response)
            }
            OcrProviderImpl::LMStudio { client } => {
                // LM Studio rejects the json_object response format
                let response = client.complete(self.openai_request(images, instructions, false)).await?;
                OpenAI::extract_text(&response)
            }
            OcrProviderImpl::Anthropic { client } => {
                let response = client.complete(self.anthropic_request(images, instructions)).await?;
                Anthropic::extract_text(&response)
            }
            OcrProviderImpl::Ollama { client } => {
                let response = client.complete(self.ollama_request(images, instructions)).await?;
                Ollama::extract_text(&response)
            }
            OcrProviderImpl::Mock { client } => {
                let request = MockRequest {
                    images: images.to_vec(),
                    instructions: instructions.to_string(),
                };
                let response = client.complete(request).await?;
                MockProvider::extract_text(&response)
            }
        };

        debug!("{} returned {} bytes for {} images", self.kind, raw.len(), images.len());
        parse_response(&raw)
    }

    fn name(&self) -> String {
        format!("{} ({})", self.kind.display_name(), self.model)
    }
}
