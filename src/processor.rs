//! Per-file cleaning pipeline.
//!
//! For every candidate path the processor reports the metadata found,
//! strips it, and reports what is left. It owns the session state: the set
//! of already-cleaned paths and the running statistics.

use crate::error::Error;
use crate::metadata::extract;
use crate::report::print_report;
use crate::strip::{self, ProcessedSet, StripOutcome};
use crate::terminal::{Palette, ProcessingStats, print_error, print_success};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Label of the report printed before stripping.
pub const BEFORE_LABEL: &str = "Metadata BEFORE cleaning";

/// Label of the report printed after stripping.
pub const AFTER_LABEL: &str = "Metadata AFTER cleaning";

/// Result of processing a single file.
#[derive(Debug)]
pub enum ProcessResult {
    /// Metadata was stripped.
    Cleaned { path: PathBuf },
    /// Nothing was done (unsupported, duplicate, not a file).
    Skipped { path: PathBuf, reason: String },
    /// Stripping failed.
    Failed { path: PathBuf, error: Error },
}

impl ProcessResult {
    pub fn is_cleaned(&self) -> bool {
        matches!(self, ProcessResult::Cleaned { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ProcessResult::Skipped { .. })
    }
}

/// Processor settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessorOptions {
    /// Suppress the before/after reports.
    pub quiet: bool,
}

/// Session-scoped file processor.
pub struct Processor {
    options: ProcessorOptions,
    processed: ProcessedSet,
    stats: ProcessingStats,
    start_time: Instant,
}

impl Processor {
    pub fn new(options: ProcessorOptions) -> Self {
        Self {
            options,
            processed: ProcessedSet::new(),
            stats: ProcessingStats::new(),
            start_time: Instant::now(),
        }
    }

    /// Paths cleaned so far this session.
    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Whether a notification for `path` could lead to a strip.
    ///
    /// False for unsupported extensions and for files already cleaned this
    /// session, including the notifications a strip raises for its own
    /// rewrite. Such paths can be dropped without waiting or counting.
    pub fn wants(&self, path: &Path) -> bool {
        strip::skip_reason(&self.processed, path).is_none()
    }

    /// Process one candidate path, print the outcome and update statistics.
    pub fn handle(&mut self, path: &Path) -> ProcessResult {
        let result = self.process(path);
        self.handle_result(&result);
        result
    }

    /// Finish the session and return its statistics.
    pub fn finish(mut self) -> ProcessingStats {
        self.stats.set_duration(self.start_time.elapsed());
        self.stats
    }

    /// Run the before-report, strip, after-report sequence for one path.
    pub fn process(&mut self, path: &Path) -> ProcessResult {
        if !path.is_file() {
            return skipped(path, "not a regular file");
        }
        if let Some(outcome) = strip::skip_reason(&self.processed, path) {
            return skipped(path, skip_text(outcome));
        }

        let palette = Palette::stdout();
        if !self.options.quiet {
            println!();
            println!(
                "{} Processing: {}",
                palette.camera(),
                palette.paint(display_name(path)).blue()
            );
            println!("{}", palette.rule());
            print_report(&extract(path), BEFORE_LABEL);
        }

        let outcome = strip::strip(&mut self.processed, path);

        if !self.options.quiet {
            print_report(&extract(path), AFTER_LABEL);
        }

        match outcome {
            Ok(StripOutcome::Cleaned) => ProcessResult::Cleaned {
                path: path.to_path_buf(),
            },
            Ok(other) => skipped(path, skip_text(other)),
            Err(error) => ProcessResult::Failed {
                path: path.to_path_buf(),
                error,
            },
        }
    }

    fn handle_result(&mut self, result: &ProcessResult) {
        let palette = Palette::stdout();

        match result {
            ProcessResult::Cleaned { path } => {
                self.stats.add_cleaned();
                print_success(&format!(
                    "Cleaned metadata from: {}",
                    palette.paint(display_name(path)).blue()
                ));
                if !self.options.quiet {
                    println!("{}", palette.rule());
                }
            }
            ProcessResult::Skipped { path, reason } => {
                self.stats.add_skipped();
                debug!(path = %path.display(), reason = %reason, "skipped");
            }
            ProcessResult::Failed { path, error } => {
                self.stats.add_failure();
                print_error(&format!("Error processing {}: {}", path.display(), error));
            }
        }
    }
}

fn skipped(path: &Path, reason: &str) -> ProcessResult {
    ProcessResult::Skipped {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn skip_text(outcome: StripOutcome) -> &'static str {
    match outcome {
        StripOutcome::Unsupported => "unsupported file type",
        StripOutcome::AlreadyProcessed => "already cleaned this session",
        StripOutcome::Cleaned => "cleaned",
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
