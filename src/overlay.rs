//! Plain mask overlay, independent of region recoloring.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};

use crate::error::RecolorResult;
use crate::validation::check_dimensions;

/// Reduces a decoded mask to a single channel.
///
/// Single-channel 8-bit masks are used as-is; anything else goes through
/// [`DynamicImage::to_luma8`].
pub fn to_mask(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        other => other.to_luma8(),
    }
}

/// Keeps `base` pixels where `mask` is non-zero and blacks out the rest.
///
/// # Errors
///
/// [`crate::RecolorError::ShapeMismatch`] if the two images differ in size.
pub fn apply_mask_overlay(base: &RgbImage, mask: &GrayImage) -> RecolorResult<RgbImage> {
    check_dimensions("mask", base.dimensions(), mask.dimensions())?;

    let mut out = base.clone();
    for (pixel, mask_pixel) in out.pixels_mut().zip(mask.pixels()) {
        if mask_pixel.0[0] == 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    Ok(out)
}
