/*!
 * Advanced SubStation Alpha document output.
 *
 * The document carries two styles: `Default` anchored bottom-center
 * (alignment 2) and `Top` anchored top-center (alignment 8).
 */

use anyhow::{Context, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::channel::Channel;

use super::event::SubtitleEvent;

/// Fixed document header, up to and including the `[Events]` format line
pub const ASS_HEADER: &str = "[Script Info]
ScriptType: v4.00+
PlayDepth: 0
ScaledBorderAndShadow: Yes
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,60,&H00FFFFFF,&H00000000,&H4D000000,&H81000000,-1,0,0,0,100,100,0,0,1,3,0,2,60,60,40,1
Style: Top,Arial,60,&H00FFFFFF,&H00000000,&H4D000000,&H81000000,-1,0,0,0,100,100,0,0,1,3,0,8,60,60,40,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// A complete subtitle document
#[derive(Debug, Clone, Default)]
pub struct AssDocument {
    /// Events in output order
    pub events: Vec<SubtitleEvent>,
}

impl AssDocument {
    /// Build a document placing every bottom event before every top event
    pub fn new(events: Vec<SubtitleEvent>) -> Self {
        let (mut ordered, top): (Vec<_>, Vec<_>) =
            events.into_iter().partition(|e| e.channel == Channel::Bottom);
        ordered.extend(top);
        Self { events: ordered }
    }

    /// Write the document, creating or truncating the file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        let file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        write!(writer, "{}", self)
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush subtitle file: {}", path.display()))?;

        Ok(())
    }
}

impl fmt::Display for AssDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", ASS_HEADER)?;
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        Ok(())
    }
}
