//! Diagnostic records produced by the compiler stages.
//!
//! A [`Flag`] is immutable once created. Equality and ordering are
//! structural so that flags can be collected in a [`DiagnosticSet`] that
//! removes exact duplicates and iterates deterministically.
//!
//! [`DiagnosticSet`]: crate::DiagnosticSet

use std::cmp::Ordering;

use serde::Serialize;

use crate::ProgramName;

/// Numeric diagnostic codes.
pub mod codes {
    /// Informational output with no associated code.
    pub const NONE: i32 = 0;
    /// Static-analysis error reported from a proof.
    pub const TYPE_ERROR: i32 = 1;
    /// A generated file could not be written.
    pub const SAVE_FAILED: i32 = 1;
    /// A source path could not be resolved or read.
    pub const BAD_FILE: i32 = 2;
    /// An infrastructure failure (engine, external tool) ended the compile.
    pub const FATAL: i32 = 3;
}

/// Severity level for a diagnostic.
///
/// Variants are ordered by their numeric value, which is also the primary
/// key used to order diagnostics for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum Severity {
    /// Informational message about the compilation process.
    Info = 0,
    /// A warning that doesn't prevent compilation.
    Warning = 1,
    /// An error that makes the compile fail.
    Error = 2,
}

impl Severity {
    /// Returns true if this is an error severity.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A source region. Lines and columns are 1-based; the default span (all
/// zeros, no program) stands for "no location".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    /// The file the span points into.
    pub program: Option<ProgramName>,
}

impl Span {
    pub fn new(
        program: Option<ProgramName>,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
            program,
        }
    }

    /// A span covering a single position.
    pub fn point(program: Option<ProgramName>, line: u32, col: u32) -> Self {
        Self::new(program, line, col, line, col)
    }

    /// Returns true for the "no location" span.
    pub fn is_unknown(&self) -> bool {
        *self == Span::default()
    }
}

/// A diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Flag {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub code: i32,
    /// The program that owns this diagnostic, if any.
    pub program: Option<ProgramName>,
}

impl Flag {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>, code: i32) -> Self {
        Self {
            severity,
            span,
            message: message.into(),
            code,
            program: None,
        }
    }

    /// Create an error flag without a location.
    pub fn error(message: impl Into<String>, code: i32) -> Self {
        Self::new(Severity::Error, Span::default(), message, code)
    }

    /// Create a warning flag without a location.
    pub fn warning(message: impl Into<String>, code: i32) -> Self {
        Self::new(Severity::Warning, Span::default(), message, code)
    }

    /// Create an info flag without a location.
    pub fn info(message: impl Into<String>, code: i32) -> Self {
        Self::new(Severity::Info, Span::default(), message, code)
    }

    /// Attach the owning program.
    pub fn in_program(mut self, program: impl Into<Option<ProgramName>>) -> Self {
        self.program = program.into();
        self
    }

    /// Attach a source span.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl PartialOrd for Flag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Severity, owning program (absent first), start position, message, code.
// The remaining span fields only break ties so the order stays total and
// consistent with equality.
impl Ord for Flag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| self.program.cmp(&other.program))
            .then_with(|| self.span.start_line.cmp(&other.span.start_line))
            .then_with(|| self.span.start_col.cmp(&other.span.start_col))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.span.end_line.cmp(&other.span.end_line))
            .then_with(|| self.span.end_col.cmp(&other.span.end_col))
            .then_with(|| self.span.program.cmp(&other.span.program))
    }
}
