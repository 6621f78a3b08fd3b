//! Custom error types for scrubwatch.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for scrubwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while watching, extracting or stripping.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error with optional path context.
    #[error("{}", io_message(path.as_deref(), source))]
    Io {
        source: io::Error,
        path: Option<PathBuf>,
    },
    /// Invalid or corrupted image file.
    #[error("Invalid image '{}': {reason}", path.display())]
    InvalidImage { path: PathBuf, reason: String },
    /// Unsupported image format.
    #[error("{}", unsupported_message(path, detected.as_deref()))]
    UnsupportedFormat {
        path: PathBuf,
        detected: Option<String>,
    },
    /// The pixel data could not be decoded.
    #[error("Failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The cleaned image could not be encoded.
    #[error("Failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The embedded EXIF structure is malformed.
    #[error("Unreadable EXIF data: {0}")]
    Exif(#[from] exif::Error),
    /// The watch target is not a directory.
    #[error("'{}' is not a valid directory", path.display())]
    NotADirectory { path: PathBuf },
    /// File not found.
    #[error("File not found: '{}'", path.display())]
    NotFound { path: PathBuf },
    /// Permission denied.
    #[error("Permission denied: '{}'", path.display())]
    PermissionDenied { path: PathBuf },
    /// The filesystem notification backend failed.
    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),
}

fn io_message(path: Option<&Path>, source: &io::Error) -> String {
    match path {
        Some(p) => format!("I/O error for '{}': {}", p.display(), source),
        None => format!("I/O error: {}", source),
    }
}

fn unsupported_message(path: &Path, detected: Option<&str>) -> String {
    match detected {
        Some(fmt) => format!("Unsupported format '{}' for '{}'", fmt, path.display()),
        None => format!("Unknown or unsupported format for '{}'", path.display()),
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io {
            source: err,
            path: None,
        }
    }
}

impl Error {
    /// Create an I/O error with path context.
    pub fn io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path },
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
            _ => Error::Io {
                source: err,
                path: Some(path),
            },
        }
    }

    /// Create an invalid image error.
    pub fn invalid_image(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidImage {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(path: impl Into<PathBuf>, detected: Option<&str>) -> Self {
        Error::UnsupportedFormat {
            path: path.into(),
            detected: detected.map(String::from),
        }
    }

    /// Wrap an `image` decoding failure, keeping I/O failures as I/O errors.
    pub fn decode(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        let path = path.into();
        match err {
            image::ImageError::IoError(io) => Error::io_with_path(io, path),
            source => Error::Decode { path, source },
        }
    }

    /// Wrap an `image` encoding failure.
    pub fn encode(path: impl Into<PathBuf>, err: image::ImageError) -> Self {
        Error::Encode {
            path: path.into(),
            source: err,
        }
    }
}
