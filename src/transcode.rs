//! Decoding, re-encoding and data URL helpers for upload preparation.
//!
//! Uploads are downscaled and re-encoded before leaving the client: PNG
//! sources stay PNG so transparency survives, everything else becomes JPEG
//! at the requested quality.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::resample::{self, DEFAULT_MAX_DIMENSION};

/// MIME type of PNG output.
pub const PNG_MIME: &str = "image/png";
/// MIME type of JPEG output.
pub const JPEG_MIME: &str = "image/jpeg";

/// Options for [`compress`].
#[derive(Debug, Clone, Copy)]
pub struct CompressOptions {
    /// Maximum output width for landscape images.
    pub max_width: u32,
    /// Maximum output height for portrait and square images.
    pub max_height: u32,
    /// JPEG quality in `[0, 1]`. Has no effect on PNG output or on geometry.
    pub quality: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            quality: 0.85,
        }
    }
}

/// A re-encoded image ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    /// The encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the encoded bytes.
    pub mime_type: &'static str,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl Compressed {
    /// Base64 of the encoded bytes, without a data URL prefix.
    #[must_use]
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Render as a `data:` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        to_data_url(self.mime_type, &self.bytes)
    }

    /// Whether `path` has an extension conventionally used for this MIME type.
    ///
    /// Paths without a recognised image extension never match.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        ImageFormat::from_path(path).is_ok_and(|format| format.to_mime_type() == self.mime_type)
    }
}

/// Decode image bytes into an RGBA buffer, reporting the detected format.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for empty input and [`Error::Image`]
/// if the format is unknown or decoding fails.
pub fn decode_image(bytes: &[u8]) -> Result<(RgbaImage, ImageFormat)> {
    if bytes.is_empty() {
        return Err(Error::UnsupportedFormat("empty input".to_string()));
    }
    let format = image::guess_format(bytes)?;
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    Ok((decoded.to_rgba8(), format))
}

/// Downscale and re-encode an uploaded image.
///
/// # Errors
///
/// Returns an error if decoding, resizing or encoding fails.
pub fn compress(bytes: &[u8], opts: &CompressOptions) -> Result<Compressed> {
    let (decoded, format) = decode_image(bytes)?;
    let resized = resample::resize(&decoded, opts.max_width, opts.max_height)?;

    let (encoded, mime_type) = if format == ImageFormat::Png {
        (encode_png(&resized)?, PNG_MIME)
    } else {
        (encode_jpeg(&resized, opts.quality)?, JPEG_MIME)
    };

    log::debug!(
        "compressed {format:?} {}x{} -> {mime_type} {}x{} ({} bytes)",
        decoded.width(),
        decoded.height(),
        resized.width(),
        resized.height(),
        encoded.len()
    );

    Ok(Compressed {
        bytes: encoded,
        mime_type,
        width: resized.width(),
        height: resized.height(),
    })
}

/// Encode as lossless PNG, preserving every bit of every channel.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(Cursor::new(&mut buffer)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Encode as JPEG; alpha is dropped.
///
/// # Errors
///
/// Returns [`Error::Image`] if encoding fails.
pub fn encode_jpeg(image: &RgbaImage, quality: f32) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut buffer), jpeg_quality(quality))
        .encode_image(&rgb)?;
    Ok(buffer)
}

/// Map a `[0, 1]` quality to the encoder's `1..=100` scale.
fn jpeg_quality(quality: f32) -> u8 {
    let quality = if quality.is_nan() { 1.0 } else { quality };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
    scaled.max(1)
}

/// Build a base64 `data:` URL.
#[must_use]
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 `data:` URL into its MIME type and decoded bytes.
///
/// # Errors
///
/// Returns [`Error::InvalidDataUrl`] if the URL is not a base64 data URL and
/// [`Error::Base64`] if the payload does not decode.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| Error::InvalidDataUrl("missing `data:` prefix".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InvalidDataUrl("missing `,` separator".to_string()))?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InvalidDataUrl("only base64 data URLs are supported".to_string()))?;

    let mime_type = if mime_type.is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    Ok((mime_type.to_string(), STANDARD.decode(payload)?))
}
