/*!
 * Batched OCR dispatch.
 *
 * Images are split into ordered batches and run through a bounded pool of
 * workers. A batch that keeps failing after its retries degrades to empty
 * text for every image it holds; the dispatcher itself never fails on a
 * backend error.
 */

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::app_config::{OcrCommonConfig, OcrConfig};
use crate::errors::ProviderError;
use crate::file_utils::FileManager;
use crate::ocr::prompts::build_instructions;
use crate::ocr::{OcrBackend, OcrImage, OcrResult, OcrService, RecognizedText};
use crate::subtitle::timecode_sort_key;

/// Counters reported after a dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Batches submitted
    pub batches: usize,
    /// Batches that exhausted their retries and were filled with empty text
    pub failed: usize,
    /// Retry attempts across all batches
    pub retries: usize,
    /// Images with a result
    pub images: usize,
}

/// Result of one batch, whatever happened to it
#[derive(Debug)]
struct BatchOutcome {
    results: Vec<OcrResult>,
    retries: usize,
    failed: bool,
}

/// Runs image batches through an OCR backend with bounded concurrency and retry
pub struct OcrDispatcher {
    /// Backend shared by all workers
    backend: Arc<dyn OcrBackend>,
    /// Full instructions sent with every batch
    instructions: String,
    /// Images per batch
    batch_size: usize,
    /// Batches in flight at once
    concurrency: usize,
    /// Attempts after the first one
    max_retries: u32,
    /// Base delay before a retry, scaled by a random factor in [0.5, 1.5)
    retry_delay: Duration,
    /// Upper bound on a single backend call
    call_timeout: Duration,
}

impl OcrDispatcher {
    /// Create a dispatcher around any backend
    pub fn new(backend: Arc<dyn OcrBackend>, common: &OcrCommonConfig, call_timeout: Duration) -> Self {
        Self {
            backend,
            instructions: build_instructions(common.prompt.as_deref()),
            batch_size: common.batch_size.max(1),
            concurrency: common.concurrent_batches.max(1),
            max_retries: common.retry_count,
            retry_delay: Duration::from_millis(common.retry_delay_ms),
            call_timeout,
        }
    }

    /// Create a dispatcher for the configured provider
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        let service = OcrService::new(config)?;
        info!("Using OCR backend {}", service.name());

        Ok(Self::new(
            Arc::new(service),
            &config.common,
            Duration::from_secs(config.get_timeout_secs()),
        ))
    }

    pub fn backend_name(&self) -> String {
        self.backend.name()
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Number of batches `image_count` images are split into
    pub fn batch_count(&self, image_count: usize) -> usize {
        image_count.div_ceil(self.batch_size)
    }

    /// OCR every image under `images_dir`, results sorted by decoded timecode
    pub async fn run<P: AsRef<Path>>(
        &self,
        images_dir: P,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<(Vec<OcrResult>, DispatchSummary)> {
        let paths = FileManager::collect_images(&images_dir)?;
        info!(
            "Found {} images in {}",
            paths.len(),
            images_dir.as_ref().display()
        );

        Ok(self.dispatch(&paths, progress_callback).await)
    }

    /// OCR the given images in order-preserving batches
    pub async fn dispatch(
        &self,
        paths: &[PathBuf],
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> (Vec<OcrResult>, DispatchSummary) {
        let batches: Vec<&[PathBuf]> = paths.chunks(self.batch_size).collect();
        let total_batches = batches.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let processed_batches = Arc::new(AtomicUsize::new(0));

        let outcomes = stream::iter(batches.into_iter().enumerate())
            .map(|(batch_index, batch)| {
                let semaphore = semaphore.clone();
                let processed_batches = processed_batches.clone();
                let progress_callback = progress_callback.clone();

                async move {
                    let _permit = semaphore.acquire().await.ok();

                    let start_time = Instant::now();
                    let outcome = self.process_batch(batch_index + 1, batch).await;
                    debug!(
                        "Batch {} finished in {:?} ({} results)",
                        batch_index + 1,
                        start_time.elapsed(),
                        outcome.results.len()
                    );

                    let current = processed_batches.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total_batches);

                    outcome
                }
            })
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut summary = DispatchSummary {
            batches: total_batches,
            ..Default::default()
        };

        // Later duplicates of a name win
        let mut merged: HashMap<String, String> = HashMap::new();
        for outcome in outcomes {
            summary.retries += outcome.retries;
            if outcome.failed {
                summary.failed += 1;
            }
            for result in outcome.results {
                merged.insert(result.image_name, result.text);
            }
        }

        let mut results: Vec<OcrResult> = merged
            .into_iter()
            .map(|(name, text)| OcrResult::new(name, text))
            .collect();
        results.sort_by_cached_key(|r| timecode_sort_key(&r.image_name));
        summary.images = results.len();

        if summary.failed > 0 {
            warn!(
                "{} of {} batches failed; their images have empty text",
                summary.failed, summary.batches
            );
        }

        (results, summary)
    }

    /// Encode, submit and retry one batch; never fails
    async fn process_batch(&self, batch_num: usize, paths: &[PathBuf]) -> BatchOutcome {
        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            match OcrImage::load(path).await {
                Ok(image) => images.push(image),
                Err(e) => warn!("Skipping unreadable image {}: {:#}", path.display(), e),
            }
        }

        let mut outcome = BatchOutcome {
            results: Vec::new(),
            retries: 0,
            failed: false,
        };
        if images.is_empty() {
            return outcome;
        }

        let mut attempt: u32 = 0;
        loop {
            match self.attempt(&images).await {
                Ok(recognized) => {
                    outcome.results = map_positions(batch_num, &images, recognized);
                    return outcome;
                }
                Err(e) if !e.is_retryable() => {
                    error!("Batch {} failed without retry: {}", batch_num, e);
                    break;
                }
                Err(e) if attempt >= self.max_retries => {
                    error!("Batch {} failed after {} retries: {}", batch_num, self.max_retries, e);
                    break;
                }
                Err(e) => {
                    attempt += 1;
                    outcome.retries += 1;

                    let jitter: f64 = rand::rng().random_range(0.5..1.5);
                    let delay = self.retry_delay.mul_f64(jitter);
                    warn!(
                        "Batch {} - {}; retry {}/{} after {:.1}s",
                        batch_num,
                        e,
                        attempt,
                        self.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        outcome.failed = true;
        outcome.results = images.iter().map(|image| OcrResult::empty(&image.name)).collect();
        outcome
    }

    /// One bounded backend call with the count check applied
    async fn attempt(&self, images: &[OcrImage]) -> Result<Vec<RecognizedText>, ProviderError> {
        let recognized = tokio::time::timeout(
            self.call_timeout,
            self.backend.recognize(images, &self.instructions),
        )
        .await
        .map_err(|_| {
            ProviderError::Transport(format!("no response within {:?}", self.call_timeout))
        })??;

        if recognized.len() != images.len() {
            return Err(ProviderError::CountMismatch {
                expected: images.len(),
                actual: recognized.len(),
            });
        }

        Ok(recognized)
    }
}

/// Attach recognized texts to image names by 1-based position
fn map_positions(batch_num: usize, images: &[OcrImage], recognized: Vec<RecognizedText>) -> Vec<OcrResult> {
    let mut texts: Vec<Option<String>> = vec![None; images.len()];

    for item in recognized {
        if (1..=images.len()).contains(&item.position) {
            texts[item.position - 1] = Some(item.text);
        } else {
            warn!("Batch {} - ignoring invalid image_order {}", batch_num, item.position);
        }
    }

    images
        .iter()
        .zip(texts)
        .map(|(image, text)| match text {
            Some(text) => OcrResult::new(&image.name, text),
            None => {
                warn!("Batch {} - no result for {}", batch_num, image.name);
                OcrResult::empty(&image.name)
            }
        })
        .collect()
}
