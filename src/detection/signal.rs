/*!
 * Frame signals produced by an external frame analyzer.
 *
 * The analyzer writes one record per frame, either as a JSON array or as
 * JSON lines:
 *
 * ```json
 * {"frame": 10, "bot": {"score": 0.97, "scene_change_prev": true}, "top": {"score": 0.1}}
 * ```
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channel::Channel;
use crate::file_utils::FileManager;

/// One channel's signal for one frame, as consumed by the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSignal {
    pub frame_index: u64,
    pub score: f32,
    pub scene_change_prev: bool,
    pub scene_change_next: bool,
}

/// Per-channel part of a frame record
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelSignal {
    /// Subtitle-presence score in [0, 1]
    pub score: f32,
    /// Scene change against the previous frame (subtitle appeared)
    #[serde(default)]
    pub scene_change_prev: bool,
    /// Scene change against the next frame (subtitle about to disappear)
    #[serde(default)]
    pub scene_change_next: bool,
}

/// All channel signals of one frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameSignals {
    pub frame: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<ChannelSignal>,
}

impl FrameSignals {
    pub fn signal(&self, channel: Channel) -> Option<FrameSignal> {
        let channel_signal = match channel {
            Channel::Bottom => self.bot,
            Channel::Top => self.top,
        }?;

        Some(FrameSignal {
            frame_index: self.frame,
            score: channel_signal.score,
            scene_change_prev: channel_signal.scene_change_prev,
            scene_change_next: channel_signal.scene_change_next,
        })
    }
}

/// Source of per-frame subtitle signals
pub trait FrameAnalyzer {
    /// All frame records in increasing frame order
    fn signals(&self) -> Result<Vec<FrameSignals>>;
}

/// Signals recorded to a file by an external analyzer
#[derive(Debug, Clone)]
pub struct SignalFile {
    path: PathBuf,
}

impl SignalFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Parse either a JSON array or JSON lines
    pub fn parse(content: &str) -> Result<Vec<FrameSignals>> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).context("Failed to parse frame signal array");
        }

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<FrameSignals>(line)
                    .with_context(|| format!("Failed to parse frame signal on line {}", idx + 1))
            })
            .collect()
    }
}

impl FrameAnalyzer for SignalFile {
    fn signals(&self) -> Result<Vec<FrameSignals>> {
        let content = FileManager::read_to_string(&self.path)?;
        let mut frames = Self::parse(&content)?;
        // the analyzer may render frames out of order
        frames.sort_by_key(|f| f.frame);
        Ok(frames)
    }
}
