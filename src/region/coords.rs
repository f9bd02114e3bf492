//! Coordinate conversion from crop intent to image pixels.
//!
//! Converts a `CropSpec` into a `CropRectangle` clamped to the image bounds.
//! The result never extends past the image; an empty intersection is an error.

use super::crop::{CropRectangle, CropSpec};
use crate::error::{PipelineError, Result};

/// Resolves a crop spec against an image of the given size.
///
/// The returned rectangle is the part of the requested box that lies inside
/// the image. Fails with `InvalidCropRegion` if no pixels remain.
pub fn resolve(image_width: u32, image_height: u32, spec: &CropSpec) -> Result<CropRectangle> {
    let (x, y, width, height) = match *spec {
        CropSpec::Rect { x, y, width, height } => (x, y, width, height),
        CropSpec::Anchored {
            anchor,
            width,
            height,
            offset_x,
            offset_y,
        } => {
            let (x, y) = anchor.origin(image_width, image_height, width, height, offset_x, offset_y);
            (x, y, width as i64, height as i64)
        }
        CropSpec::Relative { x, y, width, height } => (
            (x * image_width as f32) as i64,
            (y * image_height as f32) as i64,
            (width * image_width as f32) as i64,
            (height * image_height as f32) as i64,
        ),
    };

    clamp_to_image(image_width, image_height, x, y, width, height)
}

fn clamp_to_image(
    image_width: u32,
    image_height: u32,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
) -> Result<CropRectangle> {
    let max_x = image_width as i64;
    let max_y = image_height as i64;

    let left = x.clamp(0, max_x);
    let top = y.clamp(0, max_y);
    let right = x.saturating_add(width).clamp(0, max_x);
    let bottom = y.saturating_add(height).clamp(0, max_y);

    if right <= left || bottom <= top {
        return Err(PipelineError::InvalidCropRegion {
            image_width,
            image_height,
        });
    }

    Ok(CropRectangle {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}
