//! Supported image containers and raw EXIF directory access.
//!
//! Files are selected by extension, decoded by content, and written back in
//! the container their extension names.

pub mod ifd;

use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Tiff,
    Bmp,
    WebP,
}

/// Every supported format, in the order extensions are checked.
pub const ALL_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

impl ImageFormat {
    /// Get the format name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Bmp => "BMP",
            ImageFormat::WebP => "WEBP",
        }
    }

    /// Get the file extensions mapped to this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg"],
            ImageFormat::Png => &["png"],
            ImageFormat::Tiff => &["tiff", "tif"],
            ImageFormat::Bmp => &["bmp"],
            ImageFormat::WebP => &["webp"],
        }
    }

    /// Whether the container can embed an EXIF block at all.
    pub fn carries_exif(&self) -> bool {
        !matches!(self, ImageFormat::Bmp)
    }

    /// The matching `image` crate format.
    pub fn container(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::WebP => image::ImageFormat::WebP,
        }
    }

    /// Map a format detected by the `image` crate back onto a supported one.
    pub fn from_container(format: image::ImageFormat) -> Option<Self> {
        ALL_FORMATS.into_iter().find(|f| f.container() == format)
    }
}

/// Detect format from file extension (case-insensitive).
pub fn detect_format_from_extension(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    ALL_FORMATS
        .into_iter()
        .find(|format| format.extensions().contains(&ext.as_str()))
}

/// Check if a path names a supported image file.
pub fn is_supported_path(path: &Path) -> bool {
    detect_format_from_extension(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_extension_jpeg() {
        assert_eq!(
            detect_format_from_extension(Path::new("photo.jpg")),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            detect_format_from_extension(Path::new("photo.JPEG")),
            Some(ImageFormat::Jpeg)
        );
    }

    #[test]
    fn test_detect_from_extension_all_supported() {
        for name in [
            "a.jpg", "a.jpeg", "a.png", "a.tiff", "a.tif", "a.bmp", "a.webp", "A.TIF",
        ] {
            assert!(is_supported_path(Path::new(name)), "{name} should be supported");
        }
    }

    #[test]
    fn test_detect_from_extension_unknown() {
        assert_eq!(detect_format_from_extension(Path::new("anim.gif")), None);
        assert_eq!(detect_format_from_extension(Path::new("notes.txt")), None);
        assert_eq!(detect_format_from_extension(Path::new("photo.jpg.tmp")), None);
        assert_eq!(detect_format_from_extension(Path::new("no_extension")), None);
    }

    #[test]
    fn test_format_name() {
        assert_eq!(ImageFormat::Jpeg.name(), "JPEG");
        assert_eq!(ImageFormat::Png.name(), "PNG");
        assert_eq!(ImageFormat::Tiff.name(), "TIFF");
        assert_eq!(ImageFormat::Bmp.name(), "BMP");
        assert_eq!(ImageFormat::WebP.name(), "WEBP");
    }

    #[test]
    fn test_container_round_trip() {
        for format in ALL_FORMATS {
            assert_eq!(ImageFormat::from_container(format.container()), Some(format));
        }
        assert_eq!(ImageFormat::from_container(image::ImageFormat::Gif), None);
    }

    #[test]
    fn test_bmp_has_no_exif() {
        assert!(!ImageFormat::Bmp.carries_exif());
        assert!(ImageFormat::WebP.carries_exif());
    }
}
