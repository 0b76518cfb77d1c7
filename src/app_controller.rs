use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::detection::{FrameAnalyzer, SignalFile, detect_intervals};
use crate::errors::AppError;
use crate::export::{DirectoryFrameSource, ImageExporter};
use crate::file_utils::FileManager;
use crate::ocr::OcrDispatcher;
use crate::subtitle::{Assembler, TextCleaner};

// @module: Application controller for the extraction pipeline

/// Where the pipeline writes its outputs
#[derive(Debug, Clone)]
pub struct OutputTarget {
    // @field: Directory receiving the subtitle document
    pub output_dir: PathBuf,
    // @field: Document name without extension
    pub name: String,
}

impl OutputTarget {
    pub fn new<P: AsRef<Path>>(output_dir: P, name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            name: name.into(),
        }
    }
}

/// Main application controller wiring detection, export, OCR and assembly
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Progress bars of the current run
    multi_progress: MultiProgress,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            multi_progress: MultiProgress::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn assembler(&self) -> Assembler {
        Assembler::new(TextCleaner::new(
            self.config.subtitle.fix_punctuation_spacing,
            self.config.subtitle.keep_other_letters,
        ))
    }

    fn progress_bar(&self, total: usize, unit: &str) -> ProgressBar {
        let progress_bar = self.multi_progress.add(ProgressBar::new(total as u64));
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// OCR an existing image directory with the configured backend and write the document
    pub async fn run_ocr<P: AsRef<Path>>(&self, images_dir: P, target: &OutputTarget) -> Result<PathBuf> {
        let dispatcher = OcrDispatcher::from_config(&self.config.ocr)?;
        self.run_ocr_with(&dispatcher, images_dir, target).await
    }

    /// OCR an existing image directory with the given dispatcher and write the document
    pub async fn run_ocr_with<P: AsRef<Path>>(
        &self,
        dispatcher: &OcrDispatcher,
        images_dir: P,
        target: &OutputTarget,
    ) -> Result<PathBuf> {
        let images_dir = images_dir.as_ref();
        if !images_dir.is_dir() {
            return Err(AppError::File(format!("Images directory does not exist: {}", images_dir.display())).into());
        }

        let start_time = Instant::now();
        let image_count = FileManager::collect_images(images_dir)?.len();
        info!("🚀 OCR: {} - {} images", dispatcher.backend_name(), image_count);

        let progress_bar = self.progress_bar(dispatcher.batch_count(image_count), "batches");
        progress_bar.set_message("Recognizing");
        let callback_bar = progress_bar.clone();

        let (results, summary) = dispatcher
            .run(images_dir, move |current, _total| {
                callback_bar.set_position(current as u64);
            })
            .await?;
        progress_bar.finish_and_clear();

        info!(
            "OCR finished: {} images in {} batches ({} retries, {} failed batches)",
            summary.images, summary.batches, summary.retries, summary.failed
        );

        let assembly = self.assembler().assemble(&results);
        if !assembly.skipped.is_empty() {
            warn!("{} images had unrecognized names and were left out", assembly.skipped.len());
        }

        let path = self
            .assembler()
            .write_document(assembly.events, &target.output_dir, &target.name)
            .context("Failed to write subtitle document")?;

        info!("Done in {:.1}s: {}", start_time.elapsed().as_secs_f64(), path.display());
        Ok(path)
    }

    /// Detect intervals from a signal file, export their frames into `images_dir`,
    /// then OCR and assemble them
    pub async fn run_extract<P, Q, R>(
        &self,
        signals_path: P,
        frames_dir: Q,
        images_dir: R,
        target: &OutputTarget,
    ) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let dispatcher = OcrDispatcher::from_config(&self.config.ocr)?;
        self.run_extract_with(&dispatcher, signals_path, frames_dir, images_dir, target)
            .await
    }

    /// Same as `run_extract`, with the given dispatcher
    pub async fn run_extract_with<P, Q, R>(
        &self,
        dispatcher: &OcrDispatcher,
        signals_path: P,
        frames_dir: Q,
        images_dir: R,
        target: &OutputTarget,
    ) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let frames_dir = frames_dir.as_ref();
        if !frames_dir.is_dir() {
            return Err(AppError::File(format!("Frames directory does not exist: {}", frames_dir.display())).into());
        }

        let frames = SignalFile::new(&signals_path)
            .signals()
            .with_context(|| format!("Failed to read signals from {}", signals_path.as_ref().display()))?;
        let intervals = detect_intervals(&frames, self.config.detection.score_threshold);
        info!("Detected {} subtitle intervals in {} frames", intervals.len(), frames.len());

        let exporter = ImageExporter::new(
            images_dir.as_ref(),
            self.config.detection.frame_rate()?,
            &self.config.export,
        );

        let progress_bar = self.progress_bar(intervals.len(), "images");
        progress_bar.set_message("Exporting");
        let callback_bar = progress_bar.clone();

        let summary = exporter
            .export_all(
                Arc::new(DirectoryFrameSource::new(frames_dir)),
                &intervals,
                move |current, _total| callback_bar.set_position(current as u64),
            )
            .await?;
        progress_bar.finish_and_clear();

        info!("Exported {} images ({} skipped)", summary.exported, summary.skipped);

        self.run_ocr_with(dispatcher, exporter.images_dir(), target).await
    }
}
