//! Embed and extract invisible provenance watermarks in RGBA images.
//!
//! A short text tag is hidden in the least-significant bit of each pixel's
//! red, green and blue channels, terminated by a fixed delimiter. Alpha is
//! never modified and every channel changes by at most one step, so the mark
//! is invisible at normal viewing. The mark only survives lossless storage.
//!
//! The crate also carries the upload preparation helpers that surround the
//! codec: aspect-preserving downscaling, JPEG/PNG re-encoding and base64
//! data URLs.
//!
//! # Quick Start
//!
//! ```
//! use image::RgbaImage;
//! use stego_watermark::{embed, extract};
//!
//! let img = RgbaImage::new(10, 10);
//! let marked = embed(&img, "hi").unwrap();
//! assert!(marked.is_embedded());
//! assert_eq!(extract(&marked.image).unwrap(), "hi");
//! ```
//!
//! # Files
//!
//! ```no_run
//! use std::path::Path;
//! use stego_watermark::{ProcessOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::new("generated-by:editor");
//! let opts = ProcessOptions { verify: true, ..ProcessOptions::default() };
//! let result = engine.process_file(Path::new("photo.jpg"), Path::new("photo.png"), &opts);
//! println!("{}: {}", result.path.display(), result.message);
//! ```

#![deny(missing_docs)]

mod engine;
pub mod error;
pub mod pixels;
pub mod resample;
pub mod transcode;
pub mod watermark;

pub use engine::{
    default_output_path, is_supported_image, save_image, verify_file, ProcessOptions,
    ProcessResult, WatermarkEngine,
};
pub use error::{Error, Result};
pub use pixels::image_from_raw;
pub use resample::{fit_within, resize, resize_to_match};
pub use transcode::{
    compress, decode_image, encode_png, parse_data_url, to_data_url, CompressOptions, Compressed,
};
pub use watermark::{capacity_bits, embed, extract, EmbedStatus, Embedded, DELIMITER};
