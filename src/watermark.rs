//! Least-significant-bit watermark codec.
//!
//! The payload is the UTF-8 text followed by the [`DELIMITER`], written one
//! bit per colour channel, most-significant bit of each byte first. Pixels
//! are visited in row-major order and, within a pixel, R then G then B.
//! Alpha is never touched so transparency survives untouched.

use image::RgbaImage;

use crate::error::{Error, Result};
use crate::pixels::{ensure_non_empty, pixel_count, CHANNELS_PER_PIXEL};

/// Sentinel appended to the text to mark the end of the payload.
pub const DELIMITER: &str = "::END";

/// Colour channels per pixel that carry payload bits (R, G, B).
pub const PAYLOAD_CHANNELS: usize = 3;

/// Outcome of an embedding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedStatus {
    /// The payload was written into the image.
    Embedded {
        /// Number of channel bits that carry payload.
        bits: usize,
    },
    /// The payload did not fit; the image was returned unchanged.
    Skipped {
        /// Bits needed for text plus delimiter.
        required: usize,
        /// Bits the image can hold.
        available: usize,
    },
}

/// A watermarked (or untouched) copy of the input image.
#[derive(Debug, Clone)]
pub struct Embedded {
    /// The output image.
    pub image: RgbaImage,
    /// What happened to the payload.
    pub status: EmbedStatus,
}

impl Embedded {
    /// Whether the payload was actually written.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self.status, EmbedStatus::Embedded { .. })
    }
}

/// Number of payload bits the image can carry.
#[must_use]
pub fn capacity_bits(image: &RgbaImage) -> usize {
    pixel_count(image) * PAYLOAD_CHANNELS
}

/// Number of bits needed to embed `text`, delimiter included.
#[must_use]
pub fn payload_bits(text: &str) -> usize {
    (text.len() + DELIMITER.len()) * 8
}

fn bitstream(text: &str) -> impl Iterator<Item = u8> + '_ {
    text.bytes()
        .chain(DELIMITER.bytes())
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
}

/// Embed `text` into the low bits of a copy of `image`.
///
/// If the payload needs more bits than [`capacity_bits`] allows, the copy is
/// returned unmodified with [`EmbedStatus::Skipped`] and a warning is logged.
///
/// # Errors
///
/// Returns [`Error::InvalidImageBuffer`] if the image has zero area.
pub fn embed(image: &RgbaImage, text: &str) -> Result<Embedded> {
    ensure_non_empty(image)?;

    let required = payload_bits(text);
    let available = capacity_bits(image);
    let mut marked = image.clone();

    if required > available {
        log::warn!(
            "watermark too long for {}x{} image ({required} bits > {available}), skipping",
            image.width(),
            image.height()
        );
        return Ok(Embedded {
            image: marked,
            status: EmbedStatus::Skipped {
                required,
                available,
            },
        });
    }

    let channels = marked
        .chunks_exact_mut(CHANNELS_PER_PIXEL)
        .flat_map(|pixel| pixel.iter_mut().take(PAYLOAD_CHANNELS));
    for (channel, bit) in channels.zip(bitstream(text)) {
        *channel = (*channel & 0xFE) | bit;
    }

    log::debug!("embedded {required} bits into {available} available");
    Ok(Embedded {
        image: marked,
        status: EmbedStatus::Embedded { bits: required },
    })
}

/// Recover the text previously written by [`embed`].
///
/// Stops at the first occurrence of [`DELIMITER`], so text that itself
/// contains the delimiter is truncated there.
///
/// # Errors
///
/// - [`Error::InvalidImageBuffer`] if the image has zero area.
/// - [`Error::PayloadNotFound`] if the pixel data ends before a delimiter.
/// - [`Error::InvalidPayload`] if the recovered bytes are not UTF-8.
pub fn extract(image: &RgbaImage) -> Result<String> {
    ensure_non_empty(image)?;

    let delimiter = DELIMITER.as_bytes();
    let mut payload = Vec::new();
    let mut byte = 0u8;
    let mut filled = 0;

    let channels = image
        .chunks_exact(CHANNELS_PER_PIXEL)
        .flat_map(|pixel| &pixel[..PAYLOAD_CHANNELS]);
    for channel in channels {
        byte = (byte << 1) | (channel & 1);
        filled += 1;
        if filled < 8 {
            continue;
        }

        payload.push(byte);
        byte = 0;
        filled = 0;
        if payload.ends_with(delimiter) {
            payload.truncate(payload.len() - delimiter.len());
            return Ok(String::from_utf8(payload)?);
        }
    }

    Err(Error::PayloadNotFound)
}
