//! Session statistics and the end-of-session summary box.

use super::colors::{CHECK, CROSS, Palette, Styled, WARNING};
use std::time::Duration;

const BOX_WIDTH: usize = 40;

/// Counters for one watch session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    /// Files whose metadata was stripped.
    pub cleaned: usize,
    /// Files whose strip failed.
    pub failed: usize,
    /// Notifications ignored (unsupported, duplicate, not a file).
    pub skipped: usize,
    /// How long the session ran.
    pub duration: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cleaned(&mut self) {
        self.cleaned += 1;
    }

    pub fn add_failure(&mut self) {
        self.failed += 1;
    }

    pub fn add_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// Number of notifications handled.
    pub fn total(&self) -> usize {
        self.cleaned + self.failed + self.skipped
    }
}

/// Render the summary box as lines.
pub fn summary_lines(stats: &ProcessingStats, color_enabled: bool) -> Vec<String> {
    let palette = Palette::new(color_enabled);
    let inner = BOX_WIDTH - 2;
    let rule = "\u{2500}".repeat(inner);

    // Pad on the unstyled text so escape codes do not skew the box.
    let row = |plain: String, styled: String| {
        let pad = inner.saturating_sub(plain.chars().count());
        format!("\u{2502}{}{}\u{2502}", styled, " ".repeat(pad))
    };

    let title = "Watch Session Summary";
    let left = (inner - title.len()) / 2;
    let mut lines = vec![
        format!("\u{256D}{}\u{256E}", rule),
        row(
            format!("{}{}", " ".repeat(left), title),
            format!(
                "{}{}",
                " ".repeat(left),
                palette.paint(title).bold()
            ),
        ),
        format!("\u{251C}{}\u{2524}", rule),
    ];

    let mut counter = |symbol: Styled, plain_symbol: &str, label: &str, count: usize| {
        let text = format!(" {:<9} {} files", label, count);
        lines.push(row(
            format!("  {}{}", plain_symbol, text),
            format!("  {}{}", symbol, text),
        ));
    };

    counter(palette.success(), CHECK, "Cleaned:", stats.cleaned);
    if stats.failed > 0 {
        counter(palette.error(), CROSS, "Failed:", stats.failed);
    }
    if stats.skipped > 0 {
        counter(palette.warning(), WARNING, "Skipped:", stats.skipped);
    }

    let elapsed = format!("  Time watched: {:.1}s", stats.duration.as_secs_f64());
    lines.push(row(elapsed.clone(), elapsed));
    lines.push(format!("\u{2570}{}\u{256F}", rule));
    lines
}

/// Print the summary box unless quiet.
pub fn print_summary(stats: &ProcessingStats, quiet: bool) {
    if quiet {
        return;
    }

    println!();
    for line in summary_lines(stats, Palette::stdout().enabled()) {
        println!("{}", line);
    }
}
