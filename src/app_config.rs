use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::DEFAULT_SCORE_THRESHOLD;
use crate::errors::AppError;
use crate::export::{DEFAULT_BAND_FRACTION, DEFAULT_EDGE_MARGIN_PX};
use crate::timecode::FrameRate;

/// Application configuration module
/// This module handles loading, validating and saving the configuration.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// OCR backend and batching
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Interval detection
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Frame export
    #[serde(default)]
    pub export: ExportConfig,

    /// Subtitle assembly
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// OCR backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrProvider {
    // @provider: Google Gemini through its OpenAI-compatible endpoint
    #[default]
    Gemini,
    // @provider: OpenAI
    OpenAI,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama
    Ollama,
    // @provider: Scripted in-process backend
    Mock,
}

impl OcrProvider {
    pub const ALL: [OcrProvider; 6] = [
        Self::Gemini,
        Self::OpenAI,
        Self::LMStudio,
        Self::Anthropic,
        Self::Ollama,
        Self::Mock,
    ];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::LMStudio => "LM Studio",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }

    // @returns: Environment variables consulted, in order, when no key is configured
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
            Self::OpenAI => &["OPENAI_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY"],
            Self::LMStudio | Self::Ollama | Self::Mock => &[],
        }
    }

    // @checks: Backend refuses requests without a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Gemini | Self::OpenAI | Self::Anthropic)
    }
}

impl std::fmt::Display for OcrProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for OcrProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "lmstudio" => Ok(Self::LMStudio),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds for one recognition call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Output token budget for one batch
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: OcrProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(provider_type),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// OCR service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OcrConfig {
    /// OCR backend to use
    #[serde(default)]
    pub provider: OcrProvider,

    /// Available OCR backends
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared by every backend
    #[serde(default)]
    pub common: OcrCommonConfig,
}

/// Batching and retry settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OcrCommonConfig {
    /// Replaces the default recognition prompt; the output format section is always appended
    #[serde(default)]
    pub prompt: Option<String>,

    /// Images per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches in flight at once
    #[serde(default = "default_concurrent_batches")]
    pub concurrent_batches: usize,

    /// Retries after the first attempt of a batch
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base delay before a retry, scaled by a random factor in [0.5, 1.5)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Temperature parameter for generation (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OcrCommonConfig {
    fn default() -> Self {
        Self {
            prompt: None,
            batch_size: default_batch_size(),
            concurrent_batches: default_concurrent_batches(),
            retry_count: default_retry_count(),
            retry_delay_ms: default_retry_delay_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Interval detection settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Minimum subtitle-presence score for a frame to count
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,

    /// Frame rate numerator
    #[serde(default = "default_fps_num")]
    pub fps_num: u64,

    /// Frame rate denominator
    #[serde(default = "default_fps_den")]
    pub fps_den: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            fps_num: default_fps_num(),
            fps_den: default_fps_den(),
        }
    }
}

impl DetectionConfig {
    pub fn frame_rate(&self) -> Result<FrameRate> {
        FrameRate::new(self.fps_num, self.fps_den)
    }
}

/// Frame export settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExportConfig {
    /// Frames encoded at once
    #[serde(default = "default_export_concurrency")]
    pub concurrency: usize,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Channel band height as a fraction of the frame height
    #[serde(default = "default_band_fraction")]
    pub band_fraction: f32,

    /// Rows excluded at the outer edge of each band
    #[serde(default = "default_edge_margin_px")]
    pub edge_margin_px: u32,

    /// Empty the images directory before exporting
    #[serde(default = "default_clean_images")]
    pub clean_images: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            concurrency: default_export_concurrency(),
            jpeg_quality: default_jpeg_quality(),
            band_fraction: default_band_fraction(),
            edge_margin_px: default_edge_margin_px(),
            clean_images: default_clean_images(),
        }
    }
}

/// Configuration for subtitle assembly
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SubtitleConfig {
    /// Repair spacing around sentence punctuation
    #[serde(default)]
    pub fix_punctuation_spacing: bool,

    /// Keep letters outside the cased categories (CJK, kana, ...)
    #[serde(default)]
    pub keep_other_letters: bool,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_batch_size() -> usize {
    50
}

fn default_concurrent_batches() -> usize {
    3
}

fn default_retry_count() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_score_threshold() -> f32 {
    DEFAULT_SCORE_THRESHOLD
}

fn default_fps_num() -> u64 {
    24000
}

fn default_fps_den() -> u64 {
    1001
}

fn default_export_concurrency() -> usize {
    4
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_clean_images() -> bool {
    true
}

fn default_band_fraction() -> f32 {
    DEFAULT_BAND_FRACTION
}

fn default_edge_margin_px() -> u32 {
    DEFAULT_EDGE_MARGIN_PX
}

fn default_endpoint(provider: OcrProvider) -> String {
    match provider {
        OcrProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
        OcrProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        OcrProvider::LMStudio => "http://localhost:1234/v1".to_string(),
        OcrProvider::Anthropic => "https://api.anthropic.com".to_string(),
        OcrProvider::Ollama => "http://localhost:11434".to_string(),
        OcrProvider::Mock => String::new(),
    }
}

fn default_model(provider: OcrProvider) -> String {
    match provider {
        OcrProvider::Gemini => "gemini-2.5-flash".to_string(),
        OcrProvider::OpenAI => "gpt-4o-mini".to_string(),
        // Placeholder; set to the vision model loaded in LM Studio
        OcrProvider::LMStudio => "local-model".to_string(),
        OcrProvider::Anthropic => "claude-3-5-haiku-latest".to_string(),
        OcrProvider::Ollama => "qwen2.5vl".to_string(),
        OcrProvider::Mock => "mock".to_string(),
    }
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let common = &self.ocr.common;
        if common.batch_size == 0 {
            return Err(AppError::Config("ocr.common.batch_size must be at least 1".to_string()).into());
        }
        if common.concurrent_batches == 0 {
            return Err(AppError::Config("ocr.common.concurrent_batches must be at least 1".to_string()).into());
        }
        if !(0.0..=2.0).contains(&common.temperature) {
            return Err(AppError::Config("ocr.common.temperature must be between 0.0 and 2.0".to_string()).into());
        }

        if !(0.0..=1.0).contains(&self.detection.score_threshold) {
            return Err(AppError::Config("detection.score_threshold must be between 0.0 and 1.0".to_string()).into());
        }
        self.detection
            .frame_rate()
            .map_err(|e| AppError::Config(format!("Invalid detection frame rate: {}", e)))?;

        if self.export.concurrency == 0 {
            return Err(AppError::Config("export.concurrency must be at least 1".to_string()).into());
        }
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(AppError::Config("export.jpeg_quality must be between 1 and 100".to_string()).into());
        }
        if !(self.export.band_fraction > 0.0 && self.export.band_fraction <= 0.5) {
            return Err(AppError::Config("export.band_fraction must be in (0.0, 0.5]".to_string()).into());
        }

        if self.ocr.provider.requires_api_key() && self.ocr.get_api_key().is_empty() {
            let env_vars = self.ocr.provider.api_key_env_vars().join(" or ");
            return Err(AppError::Config(format!(
                "API key is required for {} provider; set it in the config or via {}",
                self.ocr.provider.display_name(),
                env_vars
            ))
            .into());
        }

        Ok(())
    }
}

impl OcrConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Mutable access to the active provider's entry, adding a default one if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let index = match self
            .available_providers
            .iter()
            .position(|p| p.provider_type == provider_str)
        {
            Some(index) => index,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[index]
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &OcrProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.model.is_empty() => provider_config.model.clone(),
            _ => default_model(self.provider),
        }
    }

    /// Get the API key for the active provider, falling back to the environment
    pub fn get_api_key(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.api_key.is_empty() {
                return provider_config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_vars()
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(provider_config) if !provider_config.endpoint.is_empty() => provider_config.endpoint.clone(),
            _ => default_endpoint(self.provider),
        }
    }

    /// Get the per-call timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.timeout_secs > 0 => provider_config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    /// Get the output token budget for the active provider
    pub fn get_max_tokens(&self) -> u32 {
        match self.get_active_provider_config() {
            Some(provider_config) if provider_config.max_tokens > 0 => provider_config.max_tokens,
            _ => default_max_tokens(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            provider: OcrProvider::default(),
            available_providers: OcrProvider::ALL
                .iter()
                .filter(|p| **p != OcrProvider::Mock)
                .map(|p| ProviderConfig::new(*p))
                .collect(),
            common: OcrCommonConfig::default(),
        }
    }
}
