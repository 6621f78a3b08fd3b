//! Command-line configuration.

use crate::error::{Error, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default delay between a notification and processing, in milliseconds.
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// Watch a folder and strip identifying metadata from images as they arrive.
#[derive(Debug, Clone, Parser)]
#[command(name = "scrubwatch", version, about)]
pub struct Config {
    /// Directory to watch.
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    /// Wait this long after a notification before reading the file.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// Suppress the before/after metadata reports.
    #[arg(short, long)]
    pub quiet: bool,

    /// Show debug diagnostics.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
}

impl Config {
    /// Check that the watched path is an existing directory.
    pub fn validate(&self) -> Result<()> {
        if self.directory.is_dir() {
            Ok(())
        } else {
            Err(Error::NotADirectory {
                path: self.directory.clone(),
            })
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Default log filter directive for this configuration.
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }
}
