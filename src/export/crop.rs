use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::errors::ExportError;

// @module: Channel crop regions

/// Default share of the frame height holding one channel
pub const DEFAULT_BAND_FRACTION: f32 = 0.2;

/// Default margin between a band and the outer frame edge
pub const DEFAULT_EDGE_MARGIN_PX: u32 = 20;

// @struct: Crop geometry shared by both channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropConfig {
    // @field: Band height as a fraction of the frame height
    pub band_fraction: f32,

    // @field: Rows excluded at the outer edge of the band
    pub edge_margin_px: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            band_fraction: DEFAULT_BAND_FRACTION,
            edge_margin_px: DEFAULT_EDGE_MARGIN_PX,
        }
    }
}

// @struct: Pixel rectangle cut out of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Region for a channel in a `width` x `height` frame.
    ///
    /// Vertically the channel's band (bottom or top) minus the outer margin;
    /// horizontally the middle third, the side crop rounded down to even.
    pub fn for_channel(
        channel: Channel,
        width: u32,
        height: u32,
        config: &CropConfig,
    ) -> Result<Self, ExportError> {
        let band = (height as f64 * config.band_fraction as f64) as u32;
        let side = {
            let third = width / 3;
            third - third % 2
        };

        if band <= config.edge_margin_px || width <= side * 2 {
            return Err(ExportError::EmptyRegion { width, height });
        }

        let band_height = band - config.edge_margin_px;
        let y = match channel {
            Channel::Bottom => height - band,
            Channel::Top => config.edge_margin_px,
        };

        Ok(Self {
            x: side,
            y,
            width: width - side * 2,
            height: band_height,
        })
    }

    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        image.crop_imm(self.x, self.y, self.width, self.height)
    }
}
