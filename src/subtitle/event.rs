use serde::{Deserialize, Serialize};
use std::fmt;

use crate::channel::Channel;
use crate::timecode::Timecode;

// @struct: One timed line of subtitle text on one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEvent {
    // @field: First moment the text is on screen
    pub start_time: Timecode,

    // @field: Moment the text leaves the screen
    pub end_time: Timecode,

    // @field: Cleaned text; lines separated by '\n'
    pub text: String,

    // @field: Screen region the text was read from
    pub channel: Channel,
}

impl SubtitleEvent {
    pub fn new(start_time: Timecode, end_time: Timecode, text: impl Into<String>, channel: Channel) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
            channel,
        }
    }

    // @checks: Text has no visible content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    // @checks: Same caption text, ignoring case
    pub fn same_text(&self, other: &SubtitleEvent) -> bool {
        self.text.to_lowercase() == other.text.to_lowercase()
    }
}

/// Renders the event as an ASS `Dialogue` line (without trailing newline)
impl fmt::Display for SubtitleEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = self.text.replace('\r', "").replace('\n', "\\n");
        write!(
            f,
            "Dialogue: 0,{},{},{},,0,0,0,,{}",
            self.start_time.to_ass_string(),
            self.end_time.to_ass_string(),
            self.channel.style_name(),
            text
        )
    }
}
