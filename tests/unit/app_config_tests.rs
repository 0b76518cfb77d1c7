/*!
 * Tests for configuration loading, saving and validation
 */

use hardsub_ocr::app_config::{Config, LogLevel, OcrProvider};
use hardsub_ocr::errors::AppError;

use crate::common;

/// Test that a saved configuration loads back unchanged
#[test]
fn test_config_saveThenLoad_shouldPreserveValues() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.ocr.provider = OcrProvider::Ollama;
    config.ocr.common.batch_size = 12;
    config.ocr.common.prompt = Some("Read the yellow subtitles only.".to_string());
    config.export.jpeg_quality = 75;
    config.subtitle.fix_punctuation_spacing = true;
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.ocr.provider, OcrProvider::Ollama);
    assert_eq!(loaded.ocr.common.batch_size, 12);
    assert_eq!(loaded.ocr.common.prompt.as_deref(), Some("Read the yellow subtitles only."));
    assert_eq!(loaded.export.jpeg_quality, 75);
    assert!(loaded.subtitle.fix_punctuation_spacing);
    assert_eq!(loaded.log_level, LogLevel::Debug);
    assert_eq!(loaded.ocr.get_model(), "qwen2.5vl");
}

/// Test that a minimal file picks up every default
#[test]
fn test_config_minimalFile_shouldUseDefaults() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", r#"{"ocr": {"provider": "lmstudio"}}"#).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.ocr.provider, OcrProvider::LMStudio);
    assert_eq!(config.ocr.common.batch_size, 50);
    assert_eq!(config.ocr.common.concurrent_batches, 3);
    assert_eq!(config.ocr.common.retry_count, 5);
    assert!(config.export.clean_images);
    assert_eq!(config.ocr.get_endpoint(), "http://localhost:1234/v1");
    assert!((config.detection.score_threshold - 0.9).abs() < f32::EPSILON);
    assert!(config.validate().is_ok());
}

/// Test range checks
#[test]
fn test_validate_outOfRangeValues_shouldFail() {
    let mut config = Config::default();
    config.ocr.provider = OcrProvider::Ollama;
    assert!(config.validate().is_ok());

    let mut bad_band = config.clone();
    bad_band.export.band_fraction = 0.75;
    assert!(bad_band.validate().is_err());

    let mut bad_threshold = config.clone();
    bad_threshold.detection.score_threshold = 1.5;
    assert!(bad_threshold.validate().is_err());

    let mut bad_fps = config.clone();
    bad_fps.detection.fps_den = 0;
    assert!(bad_fps.validate().is_err());

    config.export.jpeg_quality = 0;
    assert!(config.validate().is_err());
}

/// Test that validation failures are typed configuration errors
#[test]
fn test_validate_missingApiKey_shouldReturnConfigError() {
    let mut config = Config::default();
    config.ocr.provider = OcrProvider::Anthropic;
    config.ocr.active_provider_config_mut().api_key = String::new();

    // the key may also come from the environment
    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        return;
    }
    let error = config.validate().unwrap_err();
    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_))));

    let mut bad_quality = Config::default();
    bad_quality.ocr.provider = OcrProvider::Ollama;
    bad_quality.export.jpeg_quality = 101;
    let error = bad_quality.validate().unwrap_err();
    assert!(error.to_string().contains("jpeg_quality"));
    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_))));
}

/// Test that a broken file is reported, not defaulted
#[test]
fn test_fromFile_invalidJson_shouldFail() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}
