//! Human-readable metadata reports.
//!
//! A report lists every tag of a snapshot in name order, flags the ones that
//! identify a person, place or device, and groups GPS fields under their own
//! sub-header. Descriptive container fields are never listed.

use crate::metadata::tags::GPS_INFO;
use crate::metadata::{DESCRIPTIVE_FIELDS, MetadataSnapshot, classify};
use crate::terminal::Palette;
use std::io::{self, Write};

/// Longest value shown before truncation, in characters.
pub const MAX_VALUE_CHARS: usize = 100;

/// Note appended to device serial numbers.
pub const SERIAL_NOTE: &str = "Device Serial Number";

/// Note appended to other sensitive tags.
pub const SENSITIVE_NOTE: &str = "Sensitive";

/// Write a report for `snapshot` under `label`.
pub fn write_report<W: Write>(
    out: &mut W,
    snapshot: &MetadataSnapshot,
    label: &str,
    color_enabled: bool,
) -> io::Result<()> {
    if snapshot.is_empty() {
        return writeln!(out, "  {}: No metadata found.", label);
    }

    let palette = Palette::new(color_enabled);
    writeln!(out, "  {}:", palette.paint(label).bold())?;

    for (name, value) in &snapshot.tags {
        if DESCRIPTIVE_FIELDS.contains(&name.as_str()) {
            continue;
        }

        let verdict = classify(name);
        let marker = if verdict.is_sensitive {
            format!("{} ", palette.lock())
        } else {
            String::new()
        };

        if let (GPS_INFO, Some(gps)) = (name.as_str(), value.as_map()) {
            writeln!(out, "    {}{} (Location Data):", marker, name)?;
            for (key, gps_value) in gps {
                writeln!(out, "      {}: {}", key, truncate(&gps_value.to_string()))?;
            }
            continue;
        }

        let note = if verdict.is_hardware_identifier {
            Some(SERIAL_NOTE)
        } else if verdict.is_sensitive {
            Some(SENSITIVE_NOTE)
        } else {
            None
        };

        let shown = truncate(&value.to_string());
        match note {
            Some(note) => writeln!(
                out,
                "    {}{}: {} {}",
                marker,
                name,
                shown,
                palette.paint(format!("\u{26A0} {}", note)).yellow()
            )?,
            None => writeln!(out, "    {}: {}", name, shown)?,
        }
    }

    Ok(())
}

/// Render a report to a string.
pub fn render(snapshot: &MetadataSnapshot, label: &str, color_enabled: bool) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_report(&mut buf, snapshot, label, color_enabled);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Print a report to stdout.
pub fn print_report(snapshot: &MetadataSnapshot, label: &str) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = write_report(&mut out, snapshot, label, Palette::stdout().enabled()) {
        tracing::warn!(error = %e, "failed to write metadata report");
    }
}

/// Cut a value to [`MAX_VALUE_CHARS`] characters, marking the cut.
pub fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_VALUE_CHARS {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(MAX_VALUE_CHARS).collect();
    cut.push_str("...");
    cut
}
