//! scrubwatch - strip identifying metadata from images as they land in a folder.
//!
//! Every new image in the watched directory is reported (what it reveals
//! about the photographer, the device and the location), re-encoded without
//! any metadata, and reported again.
//!
//! # Supported Formats
//!
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - TIFF (.tif, .tiff)
//! - BMP (.bmp)
//! - WebP (.webp)
//!
//! # Example
//!
//! ```no_run
//! use scrubwatch::metadata::extract;
//! use scrubwatch::strip::{ProcessedSet, strip};
//! use std::path::Path;
//!
//! let path = Path::new("photo.jpg");
//! let before = extract(path);
//! println!("{} tags", before.tags.len());
//!
//! let mut processed = ProcessedSet::new();
//! strip(&mut processed, path).unwrap();
//! ```

pub mod cli;
pub mod error;
pub mod formats;
pub mod metadata;
pub mod processor;
pub mod report;
pub mod strip;
pub mod terminal;
pub mod watch;

pub use cli::Config;
pub use error::{Error, Result};
pub use formats::{ImageFormat, detect_format_from_extension, is_supported_path};
pub use metadata::{MetadataSnapshot, Value, extract};
pub use processor::{ProcessResult, Processor, ProcessorOptions};
pub use strip::{ProcessedSet, StripOutcome, strip};
pub use terminal::{ProcessingStats, print_error, print_info, print_success};
