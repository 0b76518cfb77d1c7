/*!
 * # hardsub-ocr
 *
 * A Rust library for extracting hardcoded (burned-in) subtitles from video
 * through a vision OCR backend.
 *
 * ## Features
 *
 * - Detect subtitle intervals per screen channel (bottom and top) from
 *   per-frame presence scores and scene-change flags
 * - Export one cropped, self-describing image per interval
 * - OCR images in concurrent batches using various backends:
 *   - Gemini (OpenAI-compatible endpoint)
 *   - OpenAI and LM Studio
 *   - Anthropic API
 *   - Ollama (local vision models)
 * - Retry with jittered backoff; failed batches degrade to empty text
 * - Merge duplicate captures into a clean two-channel ASS subtitle
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `detection`: Frame signals and the per-channel interval state machine
 * - `export`: Cropping and writing interval frames
 * - `ocr`: Batched OCR dispatch:
 *   - `ocr::prompts`: Recognition instructions
 *   - `ocr::response`: Parsing backend output
 *   - `ocr::service`: Provider selection behind one `recognize` capability
 *   - `ocr::dispatcher`: Batching, concurrency and retry
 * - `subtitle`: Filename decoding, text cleaning, merging and ASS output
 * - `providers`: Client implementations for the OCR backends:
 *   - `providers::openai`: OpenAI-compatible API client
 *   - `providers::anthropic`: Anthropic API client
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Scripted backend for tests
 * - `timecode`, `channel`: Shared value types
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod channel;
pub mod detection;
pub mod errors;
pub mod export;
pub mod file_utils;
pub mod ocr;
pub mod providers;
pub mod subtitle;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, OutputTarget};
pub use channel::Channel;
pub use detection::{Interval, IntervalDetector, detect_intervals};
pub use errors::{AppError, ExportError, NamingError, ProviderError};
pub use ocr::{OcrDispatcher, OcrResult, OcrService};
pub use subtitle::{Assembler, SubtitleEvent};
pub use timecode::{FrameRate, Timecode};
