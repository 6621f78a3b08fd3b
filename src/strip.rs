//! Metadata removal by re-encoding.
//!
//! The image is decoded to pixels, flattened to opaque RGB, and encoded again
//! in the container its extension names. Encoders here write no EXIF, XMP,
//! ICC or text chunks, so only pixel data survives. The result replaces the
//! original through a uniquely named temporary file in the same directory
//! that already carries the original permissions and timestamps.

use crate::error::{Error, Result};
use crate::formats::{ImageFormat, detect_format_from_extension};
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Rgba, RgbaImage, imageops};
use std::collections::HashSet;
use std::fs::{self, File, FileTimes};
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Quality used for lossy JPEG output.
pub const JPEG_QUALITY: u8 = 95;

/// Prefix of the temporary file written next to the target.
const TEMP_PREFIX: &str = ".scrubwatch-";

/// Suffix of that file; not a supported image extension, so it is never
/// picked up as a candidate.
const TEMP_SUFFIX: &str = ".scrub_tmp";

/// Paths already stripped during this session.
///
/// Writing the cleaned file triggers a fresh notification for the same
/// path; membership here turns that notification into a no-op.
#[derive(Debug, Default, Clone)]
pub struct ProcessedSet {
    paths: HashSet<PathBuf>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `path` was already stripped.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(&absolute_key(path))
    }

    /// Record `path` as stripped.
    pub fn insert(&mut self, path: &Path) {
        self.paths.insert(absolute_key(path));
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Key paths by absolute location so relative and absolute spellings agree.
fn absolute_key(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Outcome of a strip request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripOutcome {
    /// Metadata was removed and the file rewritten.
    Cleaned,
    /// Extension is not a supported image type; nothing done.
    Unsupported,
    /// Already stripped this session; nothing done.
    AlreadyProcessed,
}

/// Why a path would be skipped without touching it.
pub fn skip_reason(processed: &ProcessedSet, path: &Path) -> Option<StripOutcome> {
    if detect_format_from_extension(path).is_none() {
        Some(StripOutcome::Unsupported)
    } else if processed.contains(path) {
        Some(StripOutcome::AlreadyProcessed)
    } else {
        None
    }
}

/// Strip all metadata from the image at `path`, in place.
///
/// The modification time is restored afterwards and the path is added to
/// `processed`. On error the original file is left untouched.
pub fn strip(processed: &mut ProcessedSet, path: &Path) -> Result<StripOutcome> {
    if let Some(outcome) = skip_reason(processed, path) {
        debug!(path = %path.display(), ?outcome, "strip skipped");
        return Ok(outcome);
    }
    let format = detect_format_from_extension(path)
        .ok_or_else(|| Error::unsupported_format(path, None))?;

    let metadata = fs::metadata(path).map_err(|e| Error::io_with_path(e, path))?;
    let modified = metadata
        .modified()
        .map_err(|e| Error::io_with_path(e, path))?;

    let image = ImageReader::open(path)
        .map_err(|e| Error::io_with_path(e, path))?
        .with_guessed_format()
        .map_err(|e| Error::io_with_path(e, path))?
        .decode()
        .map_err(|e| Error::decode(path, e))?;

    let pixels = flatten(image);

    // Dropping the temp file on any early return removes it.
    let temp = temp_file_beside(path)?;
    let temp_path = temp.path().to_path_buf();
    write_encoded(temp.as_file(), &temp_path, &pixels, format)?;

    let file = temp.as_file();
    file.set_times(FileTimes::new().set_accessed(modified).set_modified(modified))
        .map_err(|e| Error::io_with_path(e, &temp_path))?;
    file.sync_all().map_err(|e| Error::io_with_path(e, &temp_path))?;
    fs::set_permissions(&temp_path, metadata.permissions())
        .map_err(|e| Error::io_with_path(e, &temp_path))?;
    temp.persist(path).map_err(|e| Error::io_with_path(e.error, path))?;

    processed.insert(path);
    info!(path = %path.display(), format = format.name(), "metadata stripped");
    Ok(StripOutcome::Cleaned)
}

/// Reduce any decoded image to opaque 8-bit RGB.
///
/// Images with an alpha channel are composited onto white using the alpha
/// as mask; everything else is converted directly.
pub fn flatten(image: DynamicImage) -> DynamicImage {
    if image.color().has_alpha() {
        let (width, height) = (image.width(), image.height());
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    } else if let DynamicImage::ImageRgb8(_) = image {
        image
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
    }
}

/// Create an empty, uniquely named file in the directory of `path`.
fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| Error::io_with_path(e, dir))
}

/// Encode RGB pixels into `file`; `path` names it in errors.
fn write_encoded(
    file: &File,
    path: &Path,
    image: &DynamicImage,
    format: ImageFormat,
) -> Result<()> {
    let mut writer = BufWriter::new(file);
    let (width, height) = (image.width(), image.height());
    let pixels = image.as_bytes();
    let color = ExtendedColorType::Rgb8;

    let encoded = match format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .write_image(pixels, width, height, color),
        ImageFormat::Png => {
            PngEncoder::new_with_quality(&mut writer, CompressionType::Best, FilterType::Adaptive)
                .write_image(pixels, width, height, color)
        }
        ImageFormat::Tiff => {
            TiffEncoder::new(&mut writer).write_image(pixels, width, height, color)
        }
        ImageFormat::Bmp => BmpEncoder::new(&mut writer).write_image(pixels, width, height, color),
        ImageFormat::WebP => {
            WebPEncoder::new_lossless(&mut writer).write_image(pixels, width, height, color)
        }
    };
    encoded.map_err(|e| Error::encode(path, e))?;

    writer.flush().map_err(|e| Error::io_with_path(e, path))
}
