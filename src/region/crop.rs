//! Crop intent and resolved crop rectangle types.

use serde::{Deserialize, Serialize};

/// Image edge corner that an anchored crop is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    fn is_right(self) -> bool {
        matches!(self, Anchor::TopRight | Anchor::BottomRight)
    }

    fn is_bottom(self) -> bool {
        matches!(self, Anchor::BottomLeft | Anchor::BottomRight)
    }

    /// Top-left corner of a `width`x`height` box anchored inside an image,
    /// pushed inwards by the offsets. May be negative or past the image edge;
    /// extreme offsets saturate instead of overflowing.
    pub(crate) fn origin(
        self,
        image_width: u32,
        image_height: u32,
        width: u32,
        height: u32,
        offset_x: i64,
        offset_y: i64,
    ) -> (i64, i64) {
        let x = if self.is_right() {
            (image_width as i64 - width as i64).saturating_sub(offset_x)
        } else {
            offset_x
        };
        let y = if self.is_bottom() {
            (image_height as i64 - height as i64).saturating_sub(offset_y)
        } else {
            offset_y
        };
        (x, y)
    }
}

/// What part of a captured image should be sent to OCR.
///
/// Pixel anchors belong here, in configuration, rather than in the resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropSpec {
    /// Absolute pixel rectangle. Coordinates may fall partly outside the image.
    Rect {
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    /// Fixed-size box measured from an image corner.
    Anchored {
        anchor: Anchor,
        width: u32,
        height: u32,
        #[serde(default)]
        offset_x: i64,
        #[serde(default)]
        offset_y: i64,
    },
    /// Rectangle in relative coordinates (0.0 to 1.0) that scales with the image.
    Relative {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl Default for CropSpec {
    /// Bottom-left 500x300 box, where the tracked counter sits in the game UI.
    fn default() -> Self {
        CropSpec::Anchored {
            anchor: Anchor::BottomLeft,
            width: 500,
            height: 300,
            offset_x: 0,
            offset_y: 0,
        }
    }
}

/// A resolved crop: top-left corner plus size, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRectangle {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRectangle {
    /// Returns true if the rectangle is non-empty and lies fully inside the image.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= image_width as u64
            && self.y as u64 + self.height as u64 <= image_height as u64
    }
}
