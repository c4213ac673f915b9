//! Aspect-preserving downscaling.
//!
//! Only the dominant axis is bounded: a landscape image is clamped to
//! `max_width`, a portrait or square image to `max_height`. Images are never
//! enlarged.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{Error, Result};
use crate::pixels::ensure_non_empty;

/// Default bound applied to both axes when preparing uploads.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Resampling filter; bilinear, matching what a browser canvas uses.
const FILTER: FilterType = FilterType::Triangle;

/// Compute the output dimensions for an aspect-preserving downscale.
///
/// Scaled lengths are truncated toward zero and never drop below 1.
#[must_use]
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);

    if width > height {
        if width > max_width {
            return (max_width, scale(height, max_width, width));
        }
    } else if height > max_height {
        return (scale(width, max_height, height), max_height);
    }
    (width, height)
}

fn scale(len: u32, target: u32, source: u32) -> u32 {
    let scaled = u64::from(len) * u64::from(target) / u64::from(source);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Downscale `image` so its dominant axis fits the given bound.
///
/// Returns an unchanged copy when the image already fits.
///
/// # Errors
///
/// Returns [`Error::InvalidImageBuffer`] if the image has zero area.
pub fn resize(image: &RgbaImage, max_width: u32, max_height: u32) -> Result<RgbaImage> {
    ensure_non_empty(image)?;

    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_within(width, height, max_width, max_height);
    if (new_width, new_height) == (width, height) {
        return Ok(image.clone());
    }

    log::debug!("resizing {width}x{height} -> {new_width}x{new_height}");
    Ok(imageops::resize(image, new_width, new_height, FILTER))
}

/// Resize `image` to exactly `width` x `height`, ignoring aspect ratio.
///
/// Used to bring a mask or reference image to the size of a primary image.
///
/// # Errors
///
/// Returns [`Error::InvalidImageBuffer`] if the source or the target has zero area.
pub fn resize_to_match(image: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    ensure_non_empty(image)?;
    if width == 0 || height == 0 {
        return Err(Error::InvalidImageBuffer {
            width,
            height,
            len: 0,
        });
    }

    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, FILTER))
}
