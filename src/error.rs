//! Error types for the stego-watermark crate.

/// Errors that can occur while watermarking, resampling or transcoding images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pixel buffer has zero area or its length does not match its dimensions.
    #[error("invalid image buffer ({width}x{height}, {len} bytes)")]
    InvalidImageBuffer {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Length of the raw RGBA buffer in bytes.
        len: usize,
    },

    /// The pixel data ended before the payload delimiter was found.
    #[error("no watermark payload found")]
    PayloadNotFound,

    /// A delimited payload was found but its bytes are not valid UTF-8.
    #[error("watermark payload is not valid UTF-8: {0}")]
    InvalidPayload(#[from] std::string::FromUtf8Error),

    /// A data URL could not be parsed.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// The base64 section of a data URL could not be decoded.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
