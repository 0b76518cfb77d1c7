/*!
 * Time values and their textual forms.
 *
 * Times are kept as whole milliseconds. Three renderings exist:
 * - `H:MM:SS,mmm` for signal and intermediate timestamps
 * - `H:MM:SS.cc` for the subtitle document
 * - `H_MM_SS_CC` inside exported image filenames
 */

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// A point in time, in milliseconds from the start of the video
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timecode(u64);

impl Timecode {
    pub const ZERO: Timecode = Timecode(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Split into `(hours, minutes, seconds, milliseconds)`
    pub fn components(&self) -> (u64, u64, u64, u64) {
        let ms = self.0;
        (
            ms / MS_PER_HOUR,
            (ms % MS_PER_HOUR) / MS_PER_MINUTE,
            (ms % MS_PER_MINUTE) / MS_PER_SECOND,
            ms % MS_PER_SECOND,
        )
    }

    /// Build from filename fields; centiseconds are scaled to milliseconds
    pub fn from_fields(hours: u64, minutes: u64, seconds: u64, centiseconds: u64) -> Self {
        Self(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + centiseconds * 10)
    }

    /// `H:MM:SS,mmm`
    pub fn to_millis_string(&self) -> String {
        let (h, m, s, ms) = self.components();
        format!("{}:{:02}:{:02},{:03}", h, m, s, ms)
    }

    /// `H:MM:SS.cc`, milliseconds truncated to two digits
    pub fn to_ass_string(&self) -> String {
        let (h, m, s, ms) = self.components();
        format!("{}:{:02}:{:02}.{:02}", h, m, s, ms / 10)
    }

    /// `H_MM_SS_CC`, the form embedded in image filenames
    pub fn to_filename_fields(&self) -> String {
        let (h, m, s, ms) = self.components();
        format!("{}_{:02}_{:02}_{:02}", h, m, s, ms / 10)
    }

    /// Parse `H:MM:SS,mmm` (a `.` separator is accepted as well)
    pub fn parse(timestamp: &str) -> Result<Self> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        Ok(Self(hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + millis))
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis_string())
    }
}

/// Rational frame rate, e.g. 24000/1001
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u64,
    pub den: u64,
}

impl FrameRate {
    pub fn new(num: u64, den: u64) -> Result<Self> {
        if num == 0 || den == 0 {
            return Err(anyhow!("Frame rate components must be non-zero: {}/{}", num, den));
        }
        Ok(Self { num, den })
    }

    /// Convert a frame index to a time rounded to the nearest 10 ms.
    ///
    /// The rounding is `(raw + 5) - (raw + 5) % 10` on the truncated
    /// millisecond value; existing image names depend on it.
    pub fn frame_to_timecode(&self, frame: u64) -> Timecode {
        let raw_ms = frame * self.den * 1000 / self.num;
        Timecode((raw_ms + 5) - (raw_ms + 5) % 10)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self { num: 24000, den: 1001 }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for FrameRate {
    type Err = anyhow::Error;

    /// Accepts `24000/1001` or a whole number like `25`
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((num, den)) => {
                let num = num.trim().parse().with_context(|| format!("Invalid frame rate: {}", s))?;
                let den = den.trim().parse().with_context(|| format!("Invalid frame rate: {}", s))?;
                Self::new(num, den)
            }
            None => {
                let num = s.trim().parse().with_context(|| format!("Invalid frame rate: {}", s))?;
                Self::new(num, 1)
            }
        }
    }
}
