use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

// @module: Subtitle screen regions

/// One of the two independent subtitle regions tracked per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Primary caption line at the bottom of the frame
    #[default]
    #[serde(rename = "bot")]
    Bottom,
    /// Secondary line at the top (signs, translator notes)
    Top,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Bottom, Channel::Top];

    // @returns: Token used in image filenames
    pub fn token(&self) -> &'static str {
        match self {
            Self::Bottom => "bot",
            Self::Top => "top",
        }
    }

    // @returns: Style name in the subtitle document
    pub fn style_name(&self) -> &'static str {
        match self {
            Self::Bottom => "Default",
            Self::Top => "Top",
        }
    }

    // @returns: Channel for a filename token, if it is one
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "bot" => Some(Self::Bottom),
            "top" => Some(Self::Top),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bot" | "bottom" => Ok(Self::Bottom),
            "top" => Ok(Self::Top),
            _ => Err(anyhow!("Invalid channel: {}", s)),
        }
    }
}
