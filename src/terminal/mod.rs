//! Terminal utilities for colored output and session reporting.

pub mod colors;
pub mod summary;

pub use colors::{Paint, Palette, RULE_WIDTH, Styled, print_error, print_info, print_success};
pub use summary::{ProcessingStats, print_summary, summary_lines};
