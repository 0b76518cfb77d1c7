/*!
 * Batched OCR of exported subtitle images.
 *
 * - `prompts`: recognition instructions and per-request framing
 * - `response`: parsing of model output into positioned texts
 * - `service`: the configured backend behind one `recognize` capability
 * - `dispatcher`: batching, bounded concurrency, retry and soft failure
 */

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::ProviderError;

pub use self::dispatcher::{DispatchSummary, OcrDispatcher};
pub use self::service::OcrService;

pub mod dispatcher;
pub mod prompts;
pub mod response;
pub mod service;

/// An encoded image ready to be sent to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrImage {
    /// File name, used to map results back
    pub name: String,
    /// MIME type, e.g. `image/jpeg`
    pub mime_type: String,
    /// Base64 image bytes
    pub data: String,
}

impl OcrImage {
    /// Encode raw image bytes; fails when the bytes are not a known image format
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        image::guess_format(bytes).with_context(|| format!("Unrecognized image data in {}", name))?;

        Ok(Self {
            mime_type: mime_type_for(&name).to_string(),
            data: BASE64.encode(bytes),
            name,
        })
    }

    /// Read and encode an image file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image: {}", path.display()))?;

        Self::from_bytes(name, &bytes)
    }

    /// `data:` URI form used by OpenAI-compatible APIs
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// MIME type from the file extension; anything unknown is sent as JPEG
pub fn mime_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// Text a backend read from the image at a 1-based position in the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedText {
    pub position: usize,
    pub text: String,
}

impl RecognizedText {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

/// Final text for one image; empty when nothing was read or the batch failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrResult {
    pub image_name: String,
    pub text: String,
}

impl OcrResult {
    pub fn new(image_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            text: text.into(),
        }
    }

    pub fn empty(image_name: impl Into<String>) -> Self {
        Self::new(image_name, String::new())
    }
}

/// Anything that can read subtitle text out of an ordered set of images
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Recognize every image; results carry the 1-based position of their image
    async fn recognize(
        &self,
        images: &[OcrImage],
        instructions: &str,
    ) -> Result<Vec<RecognizedText>, ProviderError>;

    /// Human-readable backend description for logs
    fn name(&self) -> String;
}
