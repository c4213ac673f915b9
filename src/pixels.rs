//! RGBA pixel buffer validation.
//!
//! Every transform in this crate works on an [`RgbaImage`]: row-major,
//! four channels per pixel, `width * height * 4` bytes.

use image::RgbaImage;

use crate::error::{Error, Result};

/// Number of channels per RGBA pixel.
pub const CHANNELS_PER_PIXEL: usize = 4;

/// Build an RGBA image from a raw buffer, validating its length and area.
///
/// # Errors
///
/// Returns [`Error::InvalidImageBuffer`] if either dimension is zero or the
/// buffer length is not exactly `width * height * 4`.
pub fn image_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaImage> {
    let len = data.len();
    let invalid = || Error::InvalidImageBuffer { width, height, len };

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|area| area.checked_mul(CHANNELS_PER_PIXEL))
        .ok_or_else(invalid)?;
    if expected == 0 || expected != len {
        return Err(invalid());
    }

    RgbaImage::from_raw(width, height, data).ok_or_else(invalid)
}

/// Reject zero-area images before any pixel iteration.
pub(crate) fn ensure_non_empty(image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::InvalidImageBuffer {
            width: image.width(),
            height: image.height(),
            len: image.as_raw().len(),
        });
    }
    Ok(())
}

/// Number of pixels in the image.
#[must_use]
pub fn pixel_count(image: &RgbaImage) -> usize {
    image.width() as usize * image.height() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_accepts_exact_length() {
        let img = image_from_raw(10, 10, vec![0; 400]).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
        assert_eq!(pixel_count(&img), 100);
    }

    #[test]
    fn from_raw_rejects_zero_area() {
        let err = image_from_raw(0, 10, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidImageBuffer {
                width: 0,
                height: 10,
                len: 0
            }
        ));
    }

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(image_from_raw(2, 2, vec![0; 15]).is_err());
        assert!(image_from_raw(2, 2, vec![0; 17]).is_err());
    }

    #[test]
    fn ensure_non_empty_flags_empty_image() {
        assert!(ensure_non_empty(&RgbaImage::new(0, 0)).is_err());
        assert!(ensure_non_empty(&RgbaImage::new(1, 1)).is_ok());
    }
}
