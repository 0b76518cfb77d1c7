/*!
 * Interval frame export.
 *
 * For every detected interval the start frame is cropped to the channel's
 * band and written as JPEG under a temporary `{channel}_{frame}.jpg` name,
 * then renamed to the self-describing `{channel}_{start}__{end}.jpg` name
 * the OCR and assembly stages read the time range back from.
 */

use futures::stream::{self, StreamExt};
use image::codecs::jpeg::JpegEncoder;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app_config::ExportConfig;
use crate::detection::Interval;
use crate::errors::ExportError;
use crate::file_utils::FileManager;
use crate::subtitle::ImageName;
use crate::timecode::FrameRate;

pub use self::crop::{CropConfig, CropRegion, DEFAULT_BAND_FRACTION, DEFAULT_EDGE_MARGIN_PX};
pub use self::frames::{DirectoryFrameSource, FrameSource};

pub mod crop;
pub mod frames;

/// Counts reported after an export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Intervals written under their final name
    pub exported: usize,
    /// Intervals whose frame could not be read, encoded or renamed
    pub skipped: usize,
}

/// Writes one cropped image per interval into an images directory
pub struct ImageExporter {
    images_dir: PathBuf,
    frame_rate: FrameRate,
    crop: CropConfig,
    jpeg_quality: u8,
    concurrency: usize,
    clean_images: bool,

    /// Serializes the collision check and rename within `images_dir`
    rename_lock: Mutex<()>,
}

impl ImageExporter {
    pub fn new<P: AsRef<Path>>(images_dir: P, frame_rate: FrameRate, config: &ExportConfig) -> Self {
        Self {
            images_dir: images_dir.as_ref().to_path_buf(),
            frame_rate,
            crop: CropConfig {
                band_fraction: config.band_fraction,
                edge_margin_px: config.edge_margin_px,
            },
            jpeg_quality: config.jpeg_quality,
            concurrency: config.concurrency.max(1),
            clean_images: config.clean_images,
            rename_lock: Mutex::new(()),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Temporary name of an interval's raw export
    pub fn temp_path(&self, interval: &Interval) -> PathBuf {
        self.images_dir
            .join(format!("{}_{}.jpg", interval.channel.token(), interval.start_frame))
    }

    /// Final name stem of an interval's image
    pub fn image_name(&self, interval: &Interval) -> ImageName {
        ImageName::new(
            interval.channel,
            self.frame_rate.frame_to_timecode(interval.start_frame),
            self.frame_rate.frame_to_timecode(interval.end_frame),
        )
    }

    /// Export every interval. Failures of single intervals are logged and
    /// counted; only failing to prepare the directory is an error.
    pub async fn export_all(
        &self,
        source: Arc<dyn FrameSource>,
        intervals: &[Interval],
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> anyhow::Result<ExportSummary> {
        FileManager::ensure_dir(&self.images_dir)?;

        if self.clean_images {
            let removed = FileManager::clear_dir(&self.images_dir)?;
            if removed > 0 {
                info!("Removed {} stale entries from {}", removed, self.images_dir.display());
            }
        }

        let total = intervals.len();
        let processed = Arc::new(AtomicUsize::new(0));

        let results = stream::iter(intervals.iter().copied())
            .map(|interval| {
                let source = source.clone();
                let processed = processed.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    let result = self.export_one(source, interval).await;

                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    (interval, result)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut summary = ExportSummary::default();
        for (interval, result) in results {
            match result {
                Ok(Some(_)) => summary.exported += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        "Failed to export {} frame {}: {}",
                        interval.channel, interval.start_frame, e
                    );
                    summary.skipped += 1;
                }
            }
        }

        info!(
            "Exported {} of {} intervals to {}",
            summary.exported,
            total,
            self.images_dir.display()
        );
        Ok(summary)
    }

    /// Export one interval; `Ok(None)` when the raw export vanished before rename
    pub async fn export_one(
        &self,
        source: Arc<dyn FrameSource>,
        interval: Interval,
    ) -> Result<Option<PathBuf>, ExportError> {
        let temp_path = self.temp_path(&interval);
        let crop = self.crop;
        let quality = self.jpeg_quality;

        let write_path = temp_path.clone();
        tokio::task::spawn_blocking(move || {
            write_frame(source.as_ref(), &interval, &crop, quality, &write_path)
        })
        .await
        .map_err(|e| ExportError::Io(std::io::Error::other(format!("join error: {}", e))))??;

        self.rename(&interval, &temp_path)
    }

    /// Move the raw export to its final, collision-free name
    fn rename(&self, interval: &Interval, temp_path: &Path) -> Result<Option<PathBuf>, ExportError> {
        let _guard = self.rename_lock.lock();

        if !temp_path.exists() {
            warn!("Image {} not found, skipping", temp_path.display());
            return Ok(None);
        }

        let stem = self.image_name(interval).stem();
        let destination = FileManager::unique_path(&self.images_dir, &stem, "jpg");
        fs::rename(temp_path, &destination)?;

        debug!("Renamed {} to {}", temp_path.display(), destination.display());
        Ok(Some(destination))
    }
}

/// Load, crop and encode an interval's start frame
fn write_frame(
    source: &dyn FrameSource,
    interval: &Interval,
    crop: &CropConfig,
    quality: u8,
    path: &Path,
) -> Result<(), ExportError> {
    let frame = source.frame(interval.start_frame)?;
    let region = CropRegion::for_channel(interval.channel, frame.width(), frame.height(), crop)?;
    let cropped = region.apply(&frame).to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder.encode_image(&cropped)?;

    fs::write(path, encoded)?;
    Ok(())
}
