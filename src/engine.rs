//! File and batch watermarking engine.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::resample;
use crate::watermark::{self, EmbedStatus, Embedded};

/// Options controlling file processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Downscale to fit `(max_width, max_height)` before embedding.
    pub max_size: Option<(u32, u32)>,
    /// Re-read the written file and check the watermark survived.
    pub verify: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (payload larger than image capacity).
    pub skipped: bool,
    /// Number of channel bits carrying the payload.
    pub bits: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            bits: 0,
            message: String::new(),
        }
    }
}

/// Embeds a fixed provenance text into images.
///
/// The watermark text is supplied once at construction and reused for every
/// image. The engine holds no other state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    text: String,
}

impl WatermarkEngine {
    /// Create an engine that embeds `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The text this engine embeds.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `image` is large enough to carry this engine's text.
    #[must_use]
    pub fn fits(&self, image: &RgbaImage) -> bool {
        watermark::payload_bits(&self.text) <= watermark::capacity_bits(image)
    }

    /// Embed the engine's text into a copy of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImageBuffer`] if the image has zero area.
    pub fn embed(&self, image: &RgbaImage) -> Result<Embedded> {
        watermark::embed(image, &self.text)
    }

    /// Check that `image` carries exactly this engine's text.
    ///
    /// # Errors
    ///
    /// Propagates extraction errors such as [`Error::PayloadNotFound`].
    pub fn verify(&self, image: &RgbaImage) -> Result<bool> {
        Ok(watermark::extract(image)? == self.text)
    }

    /// Process a single image file: load, downscale, embed, save.
    ///
    /// An image too small for the text is saved unmarked and flagged `skipped`.
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let mut rgba = match image::open(input) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        if let Some((max_width, max_height)) = opts.max_size {
            match resample::resize(&rgba, max_width, max_height) {
                Ok(resized) => rgba = resized,
                Err(e) => {
                    result.message = format!("Failed to resize: {e}");
                    return result;
                }
            }
        }

        let embedded = match self.embed(&rgba) {
            Ok(embedded) => embedded,
            Err(e) => {
                result.message = format!("Failed to embed: {e}");
                return result;
            }
        };

        let skipped = match embedded.status {
            EmbedStatus::Skipped {
                required,
                available,
            } => Some(format!(
                "Watermark too long for {}x{} image ({required} bits needed, {available} available), copied unmarked",
                rgba.width(),
                rgba.height()
            )),
            EmbedStatus::Embedded { bits } => {
                result.bits = bits;
                None
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        // Skipped images are still written so batch output stays complete.
        if let Err(e) = save_image(&embedded.image, output) {
            result.message = format!("Failed to save: {e}");
            return result;
        }

        if let Some(message) = skipped {
            result.skipped = true;
            result.success = true;
            result.message = message;
            return result;
        }

        if opts.verify {
            match verify_file(output) {
                Ok(text) if text == self.text => {}
                Ok(text) => {
                    result.message = format!("Verification failed: read back {text:?}");
                    return result;
                }
                Err(e) => {
                    result.message = format!("Verification failed: {e}");
                    return result;
                }
            }
        }

        result.success = true;
        result.message = if opts.verify {
            "Watermark embedded and verified".to_string()
        } else {
            "Watermark embedded".to_string()
        };
        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// Output files are always PNG named `{stem}.png`; inputs sharing a stem
    /// (`a.jpg`, `a.bmp`) keep their extension instead (`a.jpg.png`).
    /// Returns a [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                let mut failed = ProcessResult::new(input_dir);
                failed.message = format!("Failed to read directory: {e}");
                return vec![failed];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut failed = ProcessResult::new(output_dir);
                failed.message = format!("Failed to create output directory: {e}");
                return vec![failed];
            }
        }

        let jobs: Vec<(PathBuf, PathBuf)> = output_file_names(&entries)
            .into_iter()
            .zip(entries)
            .map(|(name, input_path)| (input_path, output_dir.join(name)))
            .collect();

        let process = |(input_path, output_path): &(PathBuf, PathBuf)| {
            self.process_file(input_path, output_path, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            jobs.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            jobs.iter().map(process).collect()
        }
    }
}

/// Load an image file and extract its watermark text.
///
/// # Errors
///
/// Returns [`Error::Image`] if the file cannot be loaded, or any extraction error.
pub fn verify_file(path: &Path) -> Result<String> {
    let rgba = image::open(path)?.to_rgba8();
    watermark::extract(&rgba)
}

/// Extensions accepted as carrier input.
const INPUT_EXTENSIONS: [&str; 5] = ["png", "bmp", "jpg", "jpeg", "webp"];

/// Check if a file can be used as a carrier image.
///
/// Lossy inputs (JPEG, WebP) are accepted because they are fully decoded
/// before embedding, but the watermarked result is always written as PNG.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| INPUT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Save a watermarked image in a lossless format.
///
/// Lossy formats would destroy the low-order bits, so only PNG and BMP
/// are accepted.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for lossy or unknown formats, or an
/// error if writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
            Ok(())
        }
        _ => Err(Error::UnsupportedFormat(format!(
            "{format:?} (watermarks need a lossless format)"
        ))),
    }
}

/// PNG output names for a batch, one per input, never colliding.
///
/// Unique stems become `{stem}.png`; shared stems keep the input extension
/// (`{name}.png`). Anything still clashing gets a numeric suffix.
fn output_file_names(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let stem_key = |p: &Path| {
        p.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase()
    };

    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for input in inputs {
        *stem_counts.entry(stem_key(input.as_path())).or_default() += 1;
    }

    let mut taken = HashSet::new();
    inputs
        .iter()
        .map(|input| {
            let base = if stem_counts[&stem_key(input.as_path())] > 1 {
                input.file_name().unwrap_or_default().to_string_lossy()
            } else {
                input.file_stem().unwrap_or_default().to_string_lossy()
            };

            let mut name = format!("{base}.png");
            let mut n = 1;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{base}-{n}.png");
                n += 1;
            }
            PathBuf::from(name)
        })
        .collect()
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_marked.png"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_marked.png"))
}
