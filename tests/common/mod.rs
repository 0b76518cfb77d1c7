/*!
 * Common test utilities for the hardsub-ocr test suite
 */

use anyhow::Result;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use hardsub_ocr::app_config::OcrCommonConfig;
use hardsub_ocr::channel::Channel;
use hardsub_ocr::ocr::{OcrDispatcher, OcrService};
use hardsub_ocr::providers::mock::MockProvider;
use hardsub_ocr::subtitle::ImageName;
use hardsub_ocr::timecode::Timecode;

/// Routes library logs to the test output; safe to call more than once
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a small solid-color PNG
pub fn create_test_image(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_sized_image(dir, filename, 32, 16)
}

/// Writes a solid-color PNG of the given size
pub fn create_sized_image(dir: &Path, filename: &str, width: u32, height: u32) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    RgbImage::from_pixel(width, height, Rgb([20, 20, 20])).save(&file_path)?;
    Ok(file_path)
}

/// Canonical image file name for a channel and a millisecond range
pub fn image_file_name(channel: Channel, start_ms: u64, end_ms: u64) -> String {
    let stem = ImageName::new(channel, Timecode::from_millis(start_ms), Timecode::from_millis(end_ms)).stem();
    format!("{}.png", stem)
}

/// Dispatcher over a mock backend with fast retries
pub fn mock_dispatcher(mock: MockProvider, batch_size: usize, retries: u32) -> OcrDispatcher {
    let common = OcrCommonConfig {
        batch_size,
        concurrent_batches: 2,
        retry_count: retries,
        retry_delay_ms: 1,
        ..Default::default()
    };
    OcrDispatcher::new(
        Arc::new(OcrService::with_mock(mock)),
        &common,
        Duration::from_secs(5),
    )
}
