//! Sinks that receive compiler messages.

use std::io::Write;

use crate::Severity;

/// Target for compiler messages.
///
/// The compiler writes progress messages as they happen and flushes the
/// collected diagnostics at the end of a compile. Implementations decide
/// where the text goes.
pub trait CompilerOutput {
    /// Write one message.
    fn write_message(&mut self, msg: &str, severity: Severity);
}

/// Terminal output: errors and warnings go to stderr, everything else to stdout.
#[derive(Debug, Default)]
pub struct StandardOutput;

impl StandardOutput {
    pub fn new() -> Self {
        Self
    }
}

impl CompilerOutput for StandardOutput {
    fn write_message(&mut self, msg: &str, severity: Severity) {
        match severity {
            Severity::Error | Severity::Warning => eprintln!("{}", msg),
            Severity::Info => println!("{}", msg),
        }
    }
}

/// Writes every message as a line to an [`std::io::Write`] implementation.
#[derive(Debug)]
pub struct StreamOutput<W: Write> {
    writer: W,
}

impl<W: Write> StreamOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CompilerOutput for StreamOutput<W> {
    fn write_message(&mut self, msg: &str, _severity: Severity) {
        if let Err(e) = writeln!(self.writer, "{}", msg) {
            tracing::warn!("failed to write compiler message: {}", e);
        }
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectedOutput {
    messages: Vec<(Severity, String)>,
}

impl CollectedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in the order they were written.
    pub fn messages(&self) -> &[(Severity, String)] {
        &self.messages
    }

    /// Message texts of the given severity.
    pub fn lines(&self, severity: Severity) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl CompilerOutput for CollectedOutput {
    fn write_message(&mut self, msg: &str, severity: Severity) {
        self.messages.push((severity, msg.to_string()));
    }
}
