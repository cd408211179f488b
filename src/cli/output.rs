//! Coloured terminal output.
//!
//! Progress and results go to stdout; warnings and errors go to stderr. Log
//! records are separate and go through `env_logger`.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes user-facing messages, honouring verbose and quiet modes.
#[derive(Debug, Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    /// Creates an output manager.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            color: ColorChoice::Auto,
        }
    }

    /// Returns whether verbose output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    fn write(
        &self,
        mut stream: StandardStream,
        color: Option<Color>,
        bold: bool,
        prefix: &str,
        message: &str,
    ) -> std::io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stream, "{prefix}")?;
        stream.reset()?;
        writeln!(stream, "{message}")
    }

    /// Prints a plain line unless quiet.
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(StandardStream::stdout(self.color), None, false, "", message)
    }

    /// Prints a message only in verbose mode.
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose || self.quiet {
            return Ok(());
        }
        self.write(
            StandardStream::stdout(self.color),
            Some(Color::Cyan),
            false,
            "  ",
            message,
        )
    }

    /// Prints a progress step.
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(
            StandardStream::stdout(self.color),
            Some(Color::Blue),
            true,
            "→ ",
            message,
        )
    }

    /// Prints a success line.
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(
            StandardStream::stdout(self.color),
            Some(Color::Green),
            true,
            "✓ ",
            message,
        )
    }

    /// Prints a warning to stderr. Shown even when quiet.
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.write(
            StandardStream::stderr(self.color),
            Some(Color::Yellow),
            true,
            "warning: ",
            message,
        )
    }

    /// Prints a section header.
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write(
            StandardStream::stdout(self.color),
            Some(Color::White),
            true,
            "",
            title,
        )
    }

    /// Prints an indented detail line.
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.println(&format!("    {message}"))
    }
}
