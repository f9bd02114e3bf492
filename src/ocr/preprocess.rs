use image::imageops::{self, FilterType};
use image::Rgba;

use crate::capture::RawImage;
use crate::error::{PipelineError, Result};
use crate::region::CropRectangle;

/// Resampling filter for upscaling. Smooth and deterministic.
const UPSCALE_FILTER: FilterType = FilterType::CatmullRom;

/// Extracts `rect` from `img` and scales it by `upscale` in each dimension.
///
/// The rectangle must lie inside the image; pixels outside it are never read.
/// An `upscale` of 0 or 1 returns the crop at native size.
pub fn crop(img: &RawImage, rect: CropRectangle, upscale: u32) -> Result<RawImage> {
    let (w, h) = img.dimensions();
    if !rect.fits_within(w, h) {
        return Err(PipelineError::InvalidCropRegion {
            image_width: w,
            image_height: h,
        });
    }

    let cropped = imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image();
    if upscale <= 1 {
        return Ok(cropped);
    }

    Ok(imageops::resize(
        &cropped,
        rect.width.saturating_mul(upscale),
        rect.height.saturating_mul(upscale),
        UPSCALE_FILTER,
    ))
}

/// Converts image to binary by keeping only bright pixels.
///
/// Pixels where R > threshold AND G > threshold AND B > threshold become black (text).
/// All other pixels become white (background). Alpha is set to opaque.
///
/// Useful when the counter is drawn in light text over a busy game scene.
pub fn threshold_bright_pixels(img: &RawImage, threshold: u8) -> RawImage {
    let (width, height) = img.dimensions();
    let mut output = RawImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b, _] = pixel.0;
        let value = if r > threshold && g > threshold && b > threshold {
            0u8
        } else {
            255u8
        };
        output.put_pixel(x, y, Rgba([value, value, value, 255]));
    }

    output
}
