/*!
 * Result assembly: OCR results to a subtitle document.
 *
 * - `naming`: image name encode/decode
 * - `cleaning`: text normalization
 * - `event`: the subtitle event type
 * - `merge`: per-channel deduplication
 * - `ass`: document output
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::ocr::OcrResult;

pub use self::ass::{ASS_HEADER, AssDocument};
pub use self::cleaning::TextCleaner;
pub use self::event::SubtitleEvent;
pub use self::merge::{merge_channel, merge_events};
pub use self::naming::{ImageName, timecode_sort_key};

pub mod ass;
pub mod cleaning;
pub mod event;
pub mod merge;
pub mod naming;

/// Outcome of assembling a result map
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Merged events, bottom channel first
    pub events: Vec<SubtitleEvent>,
    /// Image names that could not be decoded
    pub skipped: Vec<String>,
}

/// Turns OCR results into merged subtitle events
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    cleaner: TextCleaner,
}

impl Assembler {
    pub fn new(cleaner: TextCleaner) -> Self {
        Self { cleaner }
    }

    /// Decode, clean and merge. Undecodable names are skipped with a warning.
    pub fn assemble(&self, results: &[OcrResult]) -> Assembly {
        let mut candidates = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();

        for result in results {
            let decoded = match ImageName::decode(&result.image_name) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("Skipping image with unrecognized name: {}", e);
                    skipped.push(result.image_name.clone());
                    continue;
                }
            };

            let text = self.cleaner.clean(&result.text);
            if text.is_empty() {
                debug!("No text for {}", result.image_name);
                continue;
            }

            candidates.push(SubtitleEvent::new(decoded.start, decoded.end, text, decoded.channel));
        }

        let candidate_count = candidates.len();
        let events = merge_events(candidates);
        debug!("Merged {} candidates into {} events", candidate_count, events.len());

        Assembly { events, skipped }
    }

    /// Write the events to `{output_dir}/{name}.ass`, or `{name}_N.ass` if taken
    pub fn write_document<P: AsRef<Path>>(
        &self,
        events: Vec<SubtitleEvent>,
        output_dir: P,
        name: &str,
    ) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        FileManager::ensure_dir(output_dir)?;

        let path = FileManager::unique_path(output_dir, name, "ass");
        let document = AssDocument::new(events);
        document.write_to_file(&path)?;

        info!("Wrote {} subtitle events to {}", document.events.len(), path.display());
        Ok(path)
    }
}
