//! ANSI styling for operator output.
//!
//! A [`Palette`] is bound to one output stream and decides once whether
//! escape codes are emitted. Styling is off when the stream is not a
//! terminal or `NO_COLOR` is set.

use std::fmt;
use std::io::{self, IsTerminal};

/// Width of the rule printed between processed files.
pub const RULE_WIDTH: usize = 50;

pub const CHECK: &str = "\u{2713}";
pub const CROSS: &str = "\u{2717}";
pub const WARNING: &str = "\u{26A0}";
pub const INFO: &str = "\u{2139}";
pub const LOCK: &str = "\u{1F512}";
pub const CAMERA: &str = "\u{1F4F7}";

/// SGR attributes used by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Bold,
    Dim,
    Red,
    Green,
    Yellow,
    Blue,
    Cyan,
}

impl Paint {
    fn sgr(self) -> &'static str {
        match self {
            Paint::Bold => "1",
            Paint::Dim => "2",
            Paint::Red => "31",
            Paint::Green => "32",
            Paint::Yellow => "33",
            Paint::Blue => "34",
            Paint::Cyan => "36",
        }
    }
}

/// Text with SGR attributes, rendered through `Display`.
#[derive(Debug, Clone)]
pub struct Styled {
    text: String,
    paints: Vec<Paint>,
    enabled: bool,
}

impl Styled {
    pub fn paint(mut self, paint: Paint) -> Self {
        if !self.paints.contains(&paint) {
            self.paints.push(paint);
        }
        self
    }

    pub fn bold(self) -> Self {
        self.paint(Paint::Bold)
    }

    pub fn dim(self) -> Self {
        self.paint(Paint::Dim)
    }

    pub fn red(self) -> Self {
        self.paint(Paint::Red)
    }

    pub fn green(self) -> Self {
        self.paint(Paint::Green)
    }

    pub fn yellow(self) -> Self {
        self.paint(Paint::Yellow)
    }

    pub fn blue(self) -> Self {
        self.paint(Paint::Blue)
    }

    pub fn cyan(self) -> Self {
        self.paint(Paint::Cyan)
    }
}

impl fmt::Display for Styled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled || self.paints.is_empty() {
            return f.write_str(&self.text);
        }

        let codes: Vec<&str> = self.paints.iter().map(|p| p.sgr()).collect();
        write!(f, "\x1b[{}m{}\x1b[0m", codes.join(";"), self.text)
    }
}

/// Style factory for one output stream.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Palette for stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout().is_terminal() && !no_color())
    }

    /// Palette for stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr().is_terminal() && !no_color())
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Start styling `text`.
    pub fn paint(&self, text: impl Into<String>) -> Styled {
        Styled {
            text: text.into(),
            paints: Vec::new(),
            enabled: self.enabled,
        }
    }

    pub fn success(&self) -> Styled {
        self.paint(CHECK).green().bold()
    }

    pub fn error(&self) -> Styled {
        self.paint(CROSS).red().bold()
    }

    pub fn warning(&self) -> Styled {
        self.paint(WARNING).yellow().bold()
    }

    pub fn info(&self) -> Styled {
        self.paint(INFO).blue().bold()
    }

    /// Marks a privacy-sensitive tag.
    pub fn lock(&self) -> Styled {
        self.paint(LOCK)
    }

    /// Heads a processed file.
    pub fn camera(&self) -> Styled {
        self.paint(CAMERA)
    }

    /// Dimmed horizontal rule.
    pub fn rule(&self) -> Styled {
        self.paint("-".repeat(RULE_WIDTH)).dim()
    }
}

fn no_color() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

/// Print `message` after a green check on stdout.
pub fn print_success(message: &str) {
    println!("{} {}", Palette::stdout().success(), message);
}

/// Print `message` after a red cross on stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", Palette::stderr().error(), message);
}

/// Print `message` after an info sign on stdout.
pub fn print_info(message: &str) {
    println!("{} {}", Palette::stdout().info(), message);
}
